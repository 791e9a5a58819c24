// Schedule Domain Model
// Five-field cron expressions for registering the runner with an external scheduler.

use super::error::DomainError;

/// Default cadence: 18:30 on weekdays, after the market data is published
pub const DEFAULT_SCHEDULE: &str = "30 18 * * 1-5";

const FIELDS: [(&str, u32, u32); 5] = [
    ("minute", 0, 59),
    ("hour", 0, 23),
    ("day-of-month", 1, 31),
    ("month", 1, 12),
    // 0 and 7 both mean Sunday
    ("day-of-week", 0, 7),
];

/// A validated `minute hour day-of-month month day-of-week` expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronSchedule {
    fields: Vec<String>,
}

impl CronSchedule {
    /// Parse and validate a five-field expression.
    ///
    /// Each field accepts `*`, single values, `a-b` ranges, `*/n` and `a-b/n`
    /// steps, and comma-separated lists of those.
    pub fn parse(expression: &str) -> Result<Self, DomainError> {
        let fields: Vec<&str> = expression.split_whitespace().collect();
        if fields.len() != FIELDS.len() {
            return Err(DomainError::InvalidSchedule(format!(
                "expected 5 fields, got {} in '{}'",
                fields.len(),
                expression
            )));
        }

        for (raw, (name, min, max)) in fields.iter().zip(FIELDS.iter()) {
            validate_field(raw, name, *min, *max)?;
        }

        Ok(Self {
            fields: fields.into_iter().map(str::to_string).collect(),
        })
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }
}

impl std::fmt::Display for CronSchedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.fields.join(" "))
    }
}

fn validate_field(raw: &str, name: &str, min: u32, max: u32) -> Result<(), DomainError> {
    for item in raw.split(',') {
        let (range, step) = match item.split_once('/') {
            Some((range, step)) => (range, Some(step)),
            None => (item, None),
        };

        if let Some(step) = step {
            let step = parse_number(step, name)?;
            if step == 0 {
                return Err(invalid(name, item, "step must be positive"));
            }
        }

        if range == "*" {
            continue;
        }

        let (start, end) = match range.split_once('-') {
            Some((start, end)) => (parse_number(start, name)?, parse_number(end, name)?),
            None => {
                if step.is_some() {
                    return Err(invalid(name, item, "step requires '*' or a range"));
                }
                let value = parse_number(range, name)?;
                (value, value)
            }
        };

        if start < min || end > max {
            return Err(invalid(
                name,
                item,
                &format!("values must be within {}-{}", min, max),
            ));
        }
        if start > end {
            return Err(invalid(name, item, "range start exceeds end"));
        }
    }
    Ok(())
}

fn parse_number(raw: &str, name: &str) -> Result<u32, DomainError> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(name, raw, "not a number"));
    }
    raw.parse()
        .map_err(|_| invalid(name, raw, "number out of range"))
}

fn invalid(name: &str, item: &str, reason: &str) -> DomainError {
    DomainError::InvalidSchedule(format!("{} field '{}': {}", name, item, reason))
}
