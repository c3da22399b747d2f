use adhocsql_common::error::{Error, Result};
use adhocsql_common::types::{DataType, Value};

/// Parameter slots discovered while planning one statement, with the type
/// each slot picked up from its context.
#[derive(Debug, Default)]
pub struct ParameterTypes {
    types: Vec<Option<DataType>>,
    anonymous: usize,
    numbered: bool,
}

impl ParameterTypes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn types(&self) -> &[Option<DataType>] {
        &self.types
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Maps placeholder text (`?` or `$n`) to a zero-based slot.
    pub fn placeholder(&mut self, text: &str) -> Result<usize> {
        let index = if text == "?" {
            if self.numbered {
                return Err(mixed_placeholders());
            }
            self.anonymous += 1;
            self.anonymous - 1
        } else if let Some(number) = text.strip_prefix('$') {
            if self.anonymous > 0 {
                return Err(mixed_placeholders());
            }
            self.numbered = true;
            match number.parse::<usize>() {
                Ok(n) if n >= 1 => n - 1,
                _ => return Err(Error::invalid_query(format!("invalid parameter {}", text))),
            }
        } else {
            return Err(Error::unsupported(format!("parameter syntax {}", text)));
        };

        if self.types.len() <= index {
            self.types.resize(index + 1, None);
        }
        Ok(index)
    }

    /// Records a type for `index` unless one is already known.
    pub fn hint(&mut self, index: usize, data_type: DataType) {
        if let Some(slot) = self.types.get_mut(index)
            && slot.is_none()
        {
            *slot = Some(data_type);
        }
    }

    /// Resolves every slot, falling back to the natural type of the literal
    /// that was lifted into it.
    pub fn finalize(self, extracted: &[Value]) -> Result<Vec<DataType>> {
        if !extracted.is_empty() && extracted.len() != self.types.len() {
            return Err(Error::internal(format!(
                "statement declares {} parameters but {} literals were extracted",
                self.types.len(),
                extracted.len()
            )));
        }

        self.types
            .into_iter()
            .enumerate()
            .map(|(i, t)| {
                t.or_else(|| extracted.get(i).and_then(Value::natural_type))
                    .ok_or_else(|| {
                        Error::invalid_query(format!(
                            "unable to infer the type of parameter {}",
                            i + 1
                        ))
                    })
            })
            .collect()
    }
}

fn mixed_placeholders() -> Error {
    Error::invalid_query("cannot mix ? and $n parameters in one statement")
}

/// The type a parameter takes when compared against a value of `t`.
///
/// Comparisons never narrow: `TINY_COL = 1000` is a legal predicate, it just
/// matches nothing.
pub fn comparison_type(t: DataType) -> DataType {
    match t {
        t if t.is_integral() => DataType::BigInt,
        DataType::Varchar(_) => DataType::Varchar(None),
        DataType::Varbinary(_) => DataType::Varbinary(None),
        other => other,
    }
}
