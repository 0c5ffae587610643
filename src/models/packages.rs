use serde::{Deserialize, Serialize};

use super::transactions::Operator;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum PackageKind {
    Internet,
    Minute,
    Bundle,
    Offer,
}

/// Catalog entry maintained by the operator; read-only to the user flow.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Package {
    pub id: String,
    pub operator: Operator,
    pub name: String,
    pub price: f64,
    pub validity: String,
    pub kind: PackageKind,
    pub description: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewPackage {
    pub operator: Operator,
    pub name: String,
    pub price: f64,
    pub validity: String,
    pub kind: PackageKind,
    pub description: String,
}
