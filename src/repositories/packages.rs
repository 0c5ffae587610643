use anyhow::bail;
use sled::Db;
use uuid::Uuid;

use crate::models::packages::{NewPackage, Package};

const PACKAGES_TREE: &str = "packages";

/// Operator catalog. Create and delete only; there is no update path.
#[derive(Clone)]
pub struct PackageRepository {
    tree: sled::Tree,
}

impl PackageRepository {
    pub fn new(db: &Db) -> Result<Self, anyhow::Error> {
        let tree = db.open_tree(PACKAGES_TREE)?;
        Ok(PackageRepository { tree })
    }

    pub fn insert_package(&self, new: NewPackage) -> Result<Package, anyhow::Error> {
        let package = Package {
            id: Uuid::new_v4().hyphenated().to_string(),
            operator: new.operator,
            name: new.name,
            price: new.price,
            validity: new.validity,
            kind: new.kind,
            description: new.description,
        };
        let encoded = serde_json::to_vec(&package)?;
        self.tree.insert(package.id.as_bytes(), encoded)?;
        Ok(package)
    }

    pub fn list_packages(&self) -> Result<Vec<Package>, anyhow::Error> {
        let mut packages = Vec::new();
        for kv in self.tree.iter() {
            let (_, ivec) = kv?;
            packages.push(serde_json::from_slice::<Package>(&ivec)?);
        }
        packages.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(packages)
    }

    pub fn delete_package(&self, id: &str) -> Result<(), anyhow::Error> {
        if self.tree.remove(id.as_bytes())?.is_none() {
            bail!("package not found: {}", id);
        }
        Ok(())
    }
}
