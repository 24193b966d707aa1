use crate::domain::entities::query::{FieldName, SortKey, SortSpec};

#[derive(Debug, Clone, PartialEq)]
pub struct Client {
    pub id: i64,
    pub company_name: String,
    pub contact_name: String,
    pub email: String,
    pub phone: String,
    pub city: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientField {
    CompanyName,
    ContactName,
    Email,
    City,
    CreatedAt,
}

impl FieldName for ClientField {
    fn name(&self) -> &'static str {
        match self {
            ClientField::CompanyName => "company_name",
            ClientField::ContactName => "contact_name",
            ClientField::Email => "email",
            ClientField::City => "city",
            ClientField::CreatedAt => "created_at",
        }
    }

    fn searchable() -> &'static [Self] {
        &[
            ClientField::CompanyName,
            ClientField::ContactName,
            ClientField::Email,
        ]
    }

    fn default_sort() -> SortSpec<Self> {
        SortSpec::single(SortKey::desc(ClientField::CreatedAt))
    }
}
