use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("invalid ISO date format for {name}: {value}")]
    InvalidSetting { name: &'static str, value: String },
}

impl DomainError {
    pub fn invalid_setting(name: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidSetting {
            name,
            value: value.into(),
        }
    }
}
