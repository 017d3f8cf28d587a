//! Shape checks for the status API response.

use serde_json::Value;

use crate::error::{HeraldError, Result};

pub const KEY_HOMEWORKS: &str = "homeworks";
pub const KEY_CURRENT_DATE: &str = "current_date";

/// Check that the response is a non-empty mapping with a `homeworks` list
/// and return that list unchanged.
pub fn check_response(response: &Value) -> Result<&[Value]> {
    let fields = response
        .as_object()
        .ok_or_else(|| HeraldError::shape("Ожидался словарь в ответе API"))?;

    if fields.is_empty() {
        return Err(HeraldError::shape("Ошибка в данных, пустой словарь"));
    }

    let homeworks = fields.get(KEY_HOMEWORKS).ok_or_else(|| {
        let message = format!("Отсутствие ключа '{KEY_HOMEWORKS}' в словаре");
        tracing::error!("{message}");
        HeraldError::Shape(message)
    })?;

    homeworks
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| HeraldError::shape(format!("Ключ '{KEY_HOMEWORKS}' должен быть списком")))
}

/// Read the optional `current_date` field.
///
/// `Ok(None)` when the key is absent or null; a present value must be an
/// integer number of epoch seconds.
pub fn current_date(response: &Value) -> Result<Option<i64>> {
    match response.get(KEY_CURRENT_DATE) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value.as_i64().map(Some).ok_or_else(|| {
            HeraldError::shape(format!(
                "Ключ '{KEY_CURRENT_DATE}' должен быть целым числом, получено: {value}"
            ))
        }),
    }
}
