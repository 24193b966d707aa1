use crate::domain::entities::query::{FieldName, SortKey, SortSpec};

#[derive(Debug, Clone, PartialEq)]
pub struct Driver {
    pub id: i64,
    pub full_name: String,
    pub license_number: String,
    pub phone: String,
    pub home_base: String,
    pub active: bool,
    pub rating: f64,
    pub created_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverField {
    FullName,
    LicenseNumber,
    HomeBase,
    Active,
    Rating,
    CreatedAt,
}

impl FieldName for DriverField {
    fn name(&self) -> &'static str {
        match self {
            DriverField::FullName => "full_name",
            DriverField::LicenseNumber => "license_number",
            DriverField::HomeBase => "home_base",
            DriverField::Active => "active",
            DriverField::Rating => "rating",
            DriverField::CreatedAt => "created_at",
        }
    }

    fn searchable() -> &'static [Self] {
        &[
            DriverField::FullName,
            DriverField::LicenseNumber,
            DriverField::HomeBase,
        ]
    }

    fn default_sort() -> SortSpec<Self> {
        SortSpec::single(SortKey::desc(DriverField::CreatedAt))
    }
}
