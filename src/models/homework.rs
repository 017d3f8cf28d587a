use serde_json::Value;

use super::status::ReviewStatus;
use crate::error::{HeraldError, Result};

pub const KEY_HOMEWORK_NAME: &str = "homework_name";
pub const KEY_STATUS: &str = "status";

/// One submission record from the `homeworks` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Homework {
    pub name: String,
    pub status: ReviewStatus,
}

impl Homework {
    /// Parse a raw record, checking both required keys.
    ///
    /// Fails with [`HeraldError::Shape`] naming the missing key, or the
    /// offending value when `status` is not a known code.
    pub fn from_value(record: &Value) -> Result<Self> {
        let fields = record
            .as_object()
            .ok_or_else(|| HeraldError::shape("Запись о домашней работе не является словарём"))?;

        let status = match fields.get(KEY_STATUS) {
            Some(Value::String(code)) => code.parse::<ReviewStatus>()?,
            Some(other) => {
                return Err(HeraldError::shape(format!(
                    "Неизвестный статус домашней работы: {other}"
                )))
            }
            None => return Err(missing_key(KEY_STATUS)),
        };

        let name = match fields.get(KEY_HOMEWORK_NAME) {
            Some(Value::String(name)) => name.clone(),
            Some(_) => {
                return Err(HeraldError::shape(format!(
                    "Ключ '{KEY_HOMEWORK_NAME}' должен быть строкой"
                )))
            }
            None => return Err(missing_key(KEY_HOMEWORK_NAME)),
        };

        Ok(Homework { name, status })
    }

    fn status_message(&self) -> String {
        format!(
            "Изменился статус проверки работы \"{}\". {}",
            self.name,
            self.status.verdict()
        )
    }
}

/// Format the status-change message for a raw record.
pub fn parse_status(record: &Value) -> Result<String> {
    let homework = Homework::from_value(record)?;
    tracing::debug!(homework = %homework.name, status = %homework.status, "parsed verdict");
    Ok(homework.status_message())
}

fn missing_key(key: &str) -> HeraldError {
    HeraldError::shape(format!("Отсутствует ключ '{key}' в записи о домашней работе"))
}
