use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Поле, которое есть у каждой записи. Уникально и
/// возрастает в порядке выдачи.
pub const TIMESTAMP_FIELD: &str = "consensus_timestamp";

// ═══════════════════════════════════════════════════════════════
//  Cursor
// ═══════════════════════════════════════════════════════════════

/// Граница между уже синхронизированными и новыми записями:
/// `consensus_timestamp` последней сохранённой записи.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(ts: impl Into<String>) -> Self {
        Self(ts.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ═══════════════════════════════════════════════════════════════
//  TransactionRecord
// ═══════════════════════════════════════════════════════════════

/// Одна запись журнала. Кроме `consensus_timestamp` ничего не разбираем,
/// остальные поля проходят как есть и в исходном порядке.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct TransactionRecord {
    fields: Map<String, Value>,
}

impl TransactionRecord {
    pub fn consensus_timestamp(&self) -> &str {
        // Проверено при создании.
        self.fields
            .get(TIMESTAMP_FIELD)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    pub fn cursor(&self) -> Cursor {
        Cursor::new(self.consensus_timestamp())
    }
}

impl TryFrom<Map<String, Value>> for TransactionRecord {
    type Error = String;

    fn try_from(fields: Map<String, Value>) -> Result<Self, Self::Error> {
        match fields.get(TIMESTAMP_FIELD) {
            Some(Value::String(_)) => Ok(Self { fields }),
            Some(other) => Err(format!("'{TIMESTAMP_FIELD}' must be a string, got {other}")),
            None => Err(format!("record without '{TIMESTAMP_FIELD}'")),
        }
    }
}

impl TryFrom<Value> for TransactionRecord {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => Self::try_from(fields),
            other => Err(format!("record must be a JSON object, got {other}")),
        }
    }
}

impl From<TransactionRecord> for Map<String, Value> {
    fn from(record: TransactionRecord) -> Self {
        record.fields
    }
}

// ═══════════════════════════════════════════════════════════════
//  Snapshot
// ═══════════════════════════════════════════════════════════════

/// Вся локальная история аккаунта, по возрастанию `consensus_timestamp`,
/// без дублей.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    records: Vec<TransactionRecord>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Собрать из сохранённых записей; нарушение порядка — ошибка.
    pub fn from_records(records: Vec<TransactionRecord>) -> Result<Self, String> {
        for pair in records.windows(2) {
            let (prev, next) = (pair[0].consensus_timestamp(), pair[1].consensus_timestamp());
            if next <= prev {
                return Err(format!("timestamps out of order: '{prev}' followed by '{next}'"));
            }
        }
        Ok(Self { records })
    }

    /// Откуда продолжать следующую выборку, `None` если пусто.
    pub fn cursor(&self) -> Option<Cursor> {
        self.records.last().map(TransactionRecord::cursor)
    }

    /// Дописать записи строго новее текущего курсора.
    ///
    /// Записи не новее курсора пропускаются, поэтому snapshot остаётся
    /// строго возрастающим, что бы ни прислал источник. Возвращает число
    /// реально добавленных записей.
    pub fn append(&mut self, records: impl IntoIterator<Item = TransactionRecord>) -> usize {
        let mut added = 0;
        for record in records {
            if let Some(last) = self.records.last() {
                if record.consensus_timestamp() <= last.consensus_timestamp() {
                    tracing::warn!(
                        ts = %record.consensus_timestamp(),
                        cursor = %last.consensus_timestamp(),
                        "skipping record at or below cursor"
                    );
                    continue;
                }
            }
            self.records.push(record);
            added += 1;
        }
        added
    }

    pub fn records(&self) -> &[TransactionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
pub(crate) fn record(ts: &str) -> TransactionRecord {
    let value = serde_json::json!({ "consensus_timestamp": ts, "result": "SUCCESS" });
    TransactionRecord::try_from(value).unwrap()
}
