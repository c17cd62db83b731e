//! Shared variable state for one checker run.
//!
//! The context owns every numeric variable and every deferred substitution
//! in flat arenas; patterns refer to them through small integer handles, so
//! nothing in a pattern points back into the context.

use indexmap::{IndexMap, IndexSet};

use crate::config::ConfigError;
use crate::errors::UndefinedVars;
use crate::expr::{self, ExprAst};

/// Handle to a numeric variable owned by the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumericVarId(u32);

/// Handle to a deferred substitution owned by the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubstId(u32);

#[derive(Debug)]
struct NumericVar {
    name: String,
    value: Option<u64>,
    /// Check-file line of the definition, or None for variables bound on
    /// the command line (and placeholder variables created by uses).
    def_line: Option<u32>,
}

/// What gets spliced into a skeleton at match time.
#[derive(Debug, Clone)]
pub enum SubstKind {
    /// Value of a string variable, regex-escaped.
    StringVar(String),
    /// Decimal rendering of an evaluated expression.
    Numeric(ExprAst),
}

/// A deferred splice into a pattern's regex skeleton.
#[derive(Debug, Clone)]
pub struct Substitution {
    /// Original variable name or expression text, quoted in diagnostics.
    pub from: String,
    pub kind: SubstKind,
    /// Offset in the skeleton where the resolved value is inserted.
    pub insert_at: usize,
}

/// Runtime state shared by all patterns of one run.
#[derive(Debug, Default)]
pub struct Context {
    /// Live values of string variables.
    strings: IndexMap<String, String>,
    /// Names ever defined as string variables. Survives scope clearing so
    /// cross-kind name collisions stay detectable.
    string_defined: IndexSet<String>,
    /// Live numeric variable table, name to arena handle.
    numerics: IndexMap<String, NumericVarId>,
    vars: Vec<NumericVar>,
    substs: Vec<Substitution>,
    line_var: Option<NumericVarId>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup_string(&self, name: &str) -> Option<&str> {
        self.strings.get(name).map(String::as_str)
    }

    /// Binds a string variable at match time.
    pub fn set_string(&mut self, name: &str, value: String) {
        self.strings.insert(name.to_string(), value);
    }

    /// Records that `name` is a string variable, for collision detection.
    pub fn mark_string_defined(&mut self, name: &str) {
        self.string_defined.insert(name.to_string());
    }

    pub fn is_string_defined(&self, name: &str) -> bool {
        self.string_defined.contains(name)
    }

    pub fn numeric_id(&self, name: &str) -> Option<NumericVarId> {
        self.numerics.get(name).copied()
    }

    /// Inserts `id` into the live numeric table under `name`.
    pub fn register_numeric(&mut self, name: &str, id: NumericVarId) {
        self.numerics.insert(name.to_string(), id);
    }

    /// Creates a numeric variable in the arena without registering it.
    pub fn make_numeric_var(&mut self, name: &str, def_line: Option<u32>) -> NumericVarId {
        let id = NumericVarId(self.vars.len() as u32);
        self.vars.push(NumericVar {
            name: name.to_string(),
            value: None,
            def_line,
        });
        id
    }

    pub fn numeric_name(&self, id: NumericVarId) -> &str {
        &self.vars[id.0 as usize].name
    }

    pub fn numeric_value(&self, id: NumericVarId) -> Option<u64> {
        self.vars[id.0 as usize].value
    }

    pub fn numeric_def_line(&self, id: NumericVarId) -> Option<u32> {
        self.vars[id.0 as usize].def_line
    }

    pub fn set_numeric_value(&mut self, id: NumericVarId, value: u64) {
        self.vars[id.0 as usize].value = Some(value);
    }

    pub fn clear_numeric_value(&mut self, id: NumericVarId) {
        self.vars[id.0 as usize].value = None;
    }

    /// Creates the `@LINE` pseudo variable. Its value is set around each
    /// pattern's execution by the matcher.
    pub fn create_line_var(&mut self) {
        assert!(self.line_var.is_none(), "@LINE already created");
        let id = self.make_numeric_var("@LINE", None);
        self.register_numeric("@LINE", id);
        self.line_var = Some(id);
    }

    pub fn line_var(&self) -> Option<NumericVarId> {
        self.line_var
    }

    pub fn make_substitution(&mut self, subst: Substitution) -> SubstId {
        let id = SubstId(self.substs.len() as u32);
        self.substs.push(subst);
        id
    }

    pub fn substitution(&self, id: SubstId) -> &Substitution {
        &self.substs[id.0 as usize]
    }

    /// Resolves a substitution to the text spliced into the skeleton:
    /// the escaped value of a string variable, or the decimal rendering of
    /// an evaluated expression.
    pub fn resolve_substitution(&self, id: SubstId) -> Result<String, UndefinedVars> {
        let subst = &self.substs[id.0 as usize];
        match &subst.kind {
            SubstKind::StringVar(name) => self
                .lookup_string(name)
                .map(crate::regex::escape)
                .ok_or_else(|| UndefinedVars(vec![name.clone()])),
            SubstKind::Numeric(expr) => expr.eval(self).map(|v| v.to_string()),
        }
    }

    /// Applies `[#]VAR=VALUE` command-line bindings. All malformed
    /// definitions are reported together.
    pub fn define_from_cli(&mut self, defines: &[String]) -> Result<(), ConfigError> {
        let mut errors = Vec::new();
        for def in defines {
            let Some(eq) = def.find('=') else {
                errors.push(format!("{def}: missing equal sign in global definition"));
                continue;
            };
            if let Some(numeric_def) = def.strip_prefix('#') {
                let name = &numeric_def[..eq - 1];
                let value_text = &numeric_def[eq..];
                let id = match expr::parse_numeric_def(name, 0, self, None) {
                    Ok(id) => id,
                    Err(e) => {
                        errors.push(format!("{def}: {}", e.message));
                        continue;
                    }
                };
                let Ok(value) = value_text.parse::<u64>() else {
                    errors.push(format!(
                        "{def}: invalid value in numeric variable definition '{value_text}'"
                    ));
                    continue;
                };
                self.set_numeric_value(id, value);
                let name = self.numeric_name(id).to_string();
                self.register_numeric(&name, id);
            } else {
                let name = &def[..eq];
                let value = &def[eq + 1..];
                let valid = match expr::scan_var_name(name) {
                    Ok((var, rest)) => !var.is_pseudo && rest.is_empty(),
                    Err(_) => false,
                };
                if !valid {
                    errors.push(format!(
                        "{def}: invalid name in string variable definition '{name}'"
                    ));
                    continue;
                }
                if self.numerics.contains_key(name) {
                    errors.push(format!(
                        "{def}: numeric variable with name '{name}' already exists"
                    ));
                    continue;
                }
                self.strings.insert(name.to_string(), value.to_string());
                self.mark_string_defined(name);
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::BadDefines(errors))
        }
    }

    /// Scope reset between label segments: erases every string variable
    /// whose name does not start with `$` and clears the value of every
    /// such numeric variable. Arena entries survive so handles held by
    /// parsed patterns stay valid.
    pub fn clear_local_vars(&mut self) {
        self.strings.retain(|name, _| name.starts_with('$'));
        let local: Vec<NumericVarId> = self
            .numerics
            .iter()
            .filter(|(name, _)| !name.starts_with('$'))
            .map(|(_, id)| *id)
            .collect();
        for id in local {
            self.clear_numeric_value(id);
        }
    }
}
