//! Flat, replayable record of a completed signature change, sufficient to
//! re-run the refactoring headlessly against the same codebase.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use recast_index::{Index, Visibility};

use crate::error::{SignatureChangeError, SignatureConflict};
use crate::signature::{ExceptionChange, MethodSignatureChange, ParameterChange};

/// One record per parameter in new order, encoded as
/// `"oldType oldName oldIndex newType newName deletedFlag"` with `-1` as
/// the old-index sentinel for added parameters. Type texts have their
/// whitespace stripped so the six-token split stays unambiguous.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SignatureChangeDescriptor {
    pub declaring_type: String,
    pub old_name: String,
    pub new_name: String,
    pub old_return_type: Option<String>,
    pub new_return_type: Option<String>,
    /// JVM-style access code of the requested visibility.
    pub visibility_code: u8,
    pub parameters: Vec<String>,
    /// `"keep Type"`, `"add Type"`, or `"delete Type"`.
    pub exceptions: Vec<String>,
    pub delegate: bool,
    pub deprecate_delegate: bool,
}

fn strip_ws(ty: &str) -> String {
    ty.chars().filter(|c| !c.is_whitespace()).collect()
}

impl SignatureChangeDescriptor {
    pub fn from_change(index: &Index, change: &MethodSignatureChange) -> Self {
        let declaring_type = index
            .symbol(change.target.symbol_id())
            .and_then(|s| s.container.clone())
            .unwrap_or_default();

        let parameters = change
            .parameters
            .iter()
            .map(|p| {
                let old_type = p.old_type.as_deref().unwrap_or(&p.new_type);
                let old_name = p.old_name.as_deref().unwrap_or(&p.new_name);
                let old_index = p.old_index.map(|i| i as i64).unwrap_or(-1);
                format!(
                    "{} {} {} {} {} {}",
                    strip_ws(old_type),
                    old_name,
                    old_index,
                    strip_ws(&p.new_type),
                    p.new_name,
                    p.deleted,
                )
            })
            .collect();

        let exceptions = change
            .exceptions
            .iter()
            .map(|e| {
                let op = match e {
                    ExceptionChange::Keep { .. } => "keep",
                    ExceptionChange::Add { .. } => "add",
                    ExceptionChange::Delete { .. } => "delete",
                };
                format!("{op} {}", strip_ws(e.ty()))
            })
            .collect();

        SignatureChangeDescriptor {
            declaring_type,
            old_name: change.old_name.clone(),
            new_name: change.new_name.clone(),
            old_return_type: change.old_return_type.clone(),
            new_return_type: change.new_return_type.clone(),
            visibility_code: change.new_visibility.code(),
            parameters,
            exceptions,
            delegate: change.delegate,
            deprecate_delegate: change.deprecate_delegate,
        }
    }

    /// Rebuild a runnable request against `index`. The target method is
    /// found by declaring type, old name, and old arity.
    pub fn to_change(&self, index: &Index) -> Result<MethodSignatureChange, SignatureChangeError> {
        let parameters = self
            .parameters
            .iter()
            .map(|record| parse_parameter(record))
            .collect::<Result<Vec<_>, _>>()?;
        let old_arity = parameters
            .iter()
            .filter(|p| p.old_index.is_some())
            .count();

        let target = index
            .methods_of(&self.declaring_type, &self.old_name)
            .into_iter()
            .find(|s| s.param_types.len() == old_arity)
            .map(|s| s.id)
            .ok_or_else(|| SignatureConflict::ParseError {
                file: self.declaring_type.clone(),
                context: "descriptor target not found",
            })?;

        let mut change = MethodSignatureChange::from_declaration(index, target.into())?;
        change.new_name = self.new_name.clone();
        change.new_return_type = self.new_return_type.clone();
        change.new_visibility = Visibility::from_code(self.visibility_code)
            .ok_or(SignatureConflict::ParseError {
                file: self.declaring_type.clone(),
                context: "descriptor visibility code",
            })?;
        change.parameters = parameters;
        change.exceptions = self
            .exceptions
            .iter()
            .map(|record| parse_exception(record))
            .collect::<Result<Vec<_>, _>>()?;
        change.delegate = self.delegate;
        change.deprecate_delegate = self.deprecate_delegate;
        Ok(change)
    }
}

fn parse_parameter(record: &str) -> Result<ParameterChange, SignatureChangeError> {
    let tokens: Vec<&str> = record.split_whitespace().collect();
    let [old_type, old_name, old_index, new_type, new_name, deleted] = tokens[..] else {
        return Err(SignatureConflict::MalformedType {
            text: record.to_string(),
        }
        .into());
    };
    let old_index: i64 = old_index
        .parse()
        .map_err(|_| SignatureConflict::MalformedType {
            text: record.to_string(),
        })?;
    let added = old_index < 0;
    let is_varargs = new_type.ends_with("...");
    Ok(ParameterChange {
        old_index: if added { None } else { Some(old_index as usize) },
        old_name: if added { None } else { Some(old_name.to_string()) },
        new_name: new_name.to_string(),
        old_type: if added { None } else { Some(old_type.to_string()) },
        new_type: new_type.to_string(),
        is_old_varargs: !added && old_type.ends_with("..."),
        is_new_varargs: is_varargs,
        default_value: None,
        deleted: deleted == "true",
    })
}

fn parse_exception(record: &str) -> Result<ExceptionChange, SignatureChangeError> {
    let malformed = || SignatureConflict::MalformedType {
        text: record.to_string(),
    };
    let (op, ty) = record.split_once(' ').ok_or_else(malformed)?;
    let ty = ty.to_string();
    match op {
        "keep" => Ok(ExceptionChange::Keep { ty }),
        "add" => Ok(ExceptionChange::Add { ty }),
        "delete" => Ok(ExceptionChange::Delete { ty }),
        _ => Err(malformed().into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn sample_index() -> Index {
        let mut files = BTreeMap::new();
        files.insert(
            "Calc.java".to_string(),
            "class Calc {\n    int add(int a, int b) {\n        return a + b;\n    }\n}\n"
                .to_string(),
        );
        Index::new(files)
    }

    #[test]
    fn descriptor_round_trips_through_serde_and_back_to_a_change() {
        let index = sample_index();
        let target = index.methods_of("Calc", "add")[0].id;
        let mut change = MethodSignatureChange::from_declaration(&index, target.into())
            .expect("resolves");
        change.new_name = "plus".to_string();
        change.parameters.swap(0, 1);
        change.parameters.push(ParameterChange::add(
            "java.util.List<String>",
            "labels",
            Some("null"),
        ));

        let descriptor = SignatureChangeDescriptor::from_change(&index, &change);
        let json = serde_json::to_string(&descriptor).expect("serializes");
        let parsed: SignatureChangeDescriptor = serde_json::from_str(&json).expect("parses");
        assert_eq!(parsed, descriptor);

        let rebuilt = parsed.to_change(&index).expect("rebuilds");
        assert_eq!(rebuilt.new_name, "plus");
        assert_eq!(rebuilt.parameters.len(), 3);
        assert_eq!(rebuilt.parameters[0].old_index, Some(1));
        assert_eq!(rebuilt.parameters[1].old_index, Some(0));
        assert_eq!(rebuilt.parameters[2].old_index, None);
        assert_eq!(rebuilt.parameters[2].new_type, "java.util.List<String>");
    }

    #[test]
    fn added_parameter_encodes_the_minus_one_sentinel() {
        let index = sample_index();
        let target = index.methods_of("Calc", "add")[0].id;
        let mut change = MethodSignatureChange::from_declaration(&index, target.into())
            .expect("resolves");
        change.parameters.push(ParameterChange::add("int", "c", None));

        let descriptor = SignatureChangeDescriptor::from_change(&index, &change);
        assert_eq!(descriptor.parameters[2], "int c -1 int c false");
    }
}
