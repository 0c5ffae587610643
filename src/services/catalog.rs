use async_trait::async_trait;
use sled::Db;
use tokio::sync::oneshot;

use super::{RequestHandler, Service, ServiceError};
use crate::models::app_settings::{AppSettings, PaymentNumbers};
use crate::models::packages::{NewPackage, Package};
use crate::repositories::app_settings::SettingsRepository;
use crate::repositories::packages::PackageRepository;

pub enum CatalogRequest {
    AddPackage {
        package: NewPackage,
        response: oneshot::Sender<Result<Package, ServiceError>>,
    },
    ListPackages {
        response: oneshot::Sender<Result<Vec<Package>, ServiceError>>,
    },
    DeletePackage {
        id: String,
        response: oneshot::Sender<Result<(), ServiceError>>,
    },
    GetAppSettings {
        response: oneshot::Sender<Result<AppSettings, ServiceError>>,
    },
    /// Read-then-overwrite singleton save; concurrent saves race under
    /// last-write-wins like every other admin edit.
    SaveAppSettings {
        settings: AppSettings,
        response: oneshot::Sender<Result<(), ServiceError>>,
    },
    GetPaymentNumbers {
        response: oneshot::Sender<Result<PaymentNumbers, ServiceError>>,
    },
    SavePaymentNumbers {
        numbers: PaymentNumbers,
        response: oneshot::Sender<Result<(), ServiceError>>,
    },
}

#[derive(Clone)]
pub struct CatalogRequestHandler {
    packages: PackageRepository,
    settings: SettingsRepository,
}

impl CatalogRequestHandler {
    pub fn new(db: &Db) -> Result<Self, anyhow::Error> {
        let packages = PackageRepository::new(db)?;
        let settings = SettingsRepository::new(db)?;

        Ok(CatalogRequestHandler { packages, settings })
    }

    async fn add_package(&self, package: NewPackage) -> Result<Package, ServiceError> {
        if package.name.trim().is_empty() {
            return Err(ServiceError::Validation(
                "Package name is required".to_string(),
            ));
        }
        if !package.price.is_finite() || package.price <= 0.0 {
            return Err(ServiceError::Validation(
                "Price must be a positive number".to_string(),
            ));
        }
        self.packages
            .insert_package(package)
            .map_err(|e| ServiceError::Database(e.to_string()))
    }

    async fn list_packages(&self) -> Result<Vec<Package>, ServiceError> {
        self.packages
            .list_packages()
            .map_err(|e| ServiceError::Database(e.to_string()))
    }

    async fn delete_package(&self, id: &str) -> Result<(), ServiceError> {
        let known = self
            .packages
            .list_packages()
            .map_err(|e| ServiceError::Database(e.to_string()))?
            .iter()
            .any(|p| p.id == id);
        if !known {
            return Err(ServiceError::NotFound);
        }
        self.packages
            .delete_package(id)
            .map_err(|e| ServiceError::Database(e.to_string()))
    }

    async fn get_app_settings(&self) -> Result<AppSettings, ServiceError> {
        self.settings
            .get_app_settings()
            .map_err(|e| ServiceError::Database(e.to_string()))
    }

    async fn save_app_settings(&self, settings: AppSettings) -> Result<(), ServiceError> {
        self.settings
            .save_app_settings(&settings)
            .map_err(|e| ServiceError::Database(e.to_string()))
    }

    async fn get_payment_numbers(&self) -> Result<PaymentNumbers, ServiceError> {
        self.settings
            .get_payment_numbers()
            .map_err(|e| ServiceError::Database(e.to_string()))
    }

    async fn save_payment_numbers(&self, numbers: PaymentNumbers) -> Result<(), ServiceError> {
        self.settings
            .save_payment_numbers(&numbers)
            .map_err(|e| ServiceError::Database(e.to_string()))
    }
}

#[async_trait]
impl RequestHandler<CatalogRequest> for CatalogRequestHandler {
    async fn handle_request(&self, request: CatalogRequest) {
        match request {
            CatalogRequest::AddPackage { package, response } => {
                let result = self.add_package(package).await;
                let _ = response.send(result);
            }
            CatalogRequest::ListPackages { response } => {
                let result = self.list_packages().await;
                let _ = response.send(result);
            }
            CatalogRequest::DeletePackage { id, response } => {
                let result = self.delete_package(&id).await;
                let _ = response.send(result);
            }
            CatalogRequest::GetAppSettings { response } => {
                let result = self.get_app_settings().await;
                let _ = response.send(result);
            }
            CatalogRequest::SaveAppSettings { settings, response } => {
                let result = self.save_app_settings(settings).await;
                let _ = response.send(result);
            }
            CatalogRequest::GetPaymentNumbers { response } => {
                let result = self.get_payment_numbers().await;
                let _ = response.send(result);
            }
            CatalogRequest::SavePaymentNumbers { numbers, response } => {
                let result = self.save_payment_numbers(numbers).await;
                let _ = response.send(result);
            }
        }
    }
}

pub struct CatalogService;

impl CatalogService {
    pub fn new() -> Self {
        CatalogService {}
    }
}

#[async_trait]
impl Service<CatalogRequest, CatalogRequestHandler> for CatalogService {}
