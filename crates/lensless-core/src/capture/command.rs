use std::fmt;

/// How named arguments are rendered on the remote command line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ArgStyle {
    /// `name=value`, switches as `name=True` (capture script).
    #[default]
    KeyValue,
    /// `--name value`, switches as a bare `--name` (display script).
    LongFlag,
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Value(String),
    Switch,
}

/// Ordered `(name, optional value)` command assembly.
///
/// Arguments whose value is absent are kept in order but never rendered, so a
/// falsy flag can be declared unconditionally at its position.
#[derive(Clone, Debug, Default)]
pub struct CommandBuilder {
    program: Vec<String>,
    args: Vec<(String, Option<Token>)>,
    style: ArgStyle,
}

impl CommandBuilder {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: vec![program.into()],
            args: Vec::new(),
            style: ArgStyle::default(),
        }
    }

    pub fn style(mut self, style: ArgStyle) -> Self {
        self.style = style;
        self
    }

    /// Append a bare positional word (script path, subcommand).
    pub fn positional(mut self, word: impl Into<String>) -> Self {
        self.program.push(word.into());
        self
    }

    pub fn arg(self, name: &str, value: impl fmt::Display) -> Self {
        self.opt(name, Some(value))
    }

    pub fn opt<V: fmt::Display>(mut self, name: &str, value: Option<V>) -> Self {
        self.args
            .push((name.to_string(), value.map(|v| Token::Value(v.to_string()))));
        self
    }

    pub fn switch(mut self, name: &str, enabled: bool) -> Self {
        self.args
            .push((name.to_string(), enabled.then_some(Token::Switch)));
        self
    }

    /// Rendered tokens, present arguments only.
    pub fn tokens(&self) -> Vec<String> {
        let mut tokens = self.program.clone();
        for (name, token) in &self.args {
            match (self.style, token) {
                (_, None) => {}
                (ArgStyle::KeyValue, Some(Token::Value(v))) => tokens.push(format!("{name}={v}")),
                (ArgStyle::KeyValue, Some(Token::Switch)) => tokens.push(format!("{name}=True")),
                (ArgStyle::LongFlag, Some(Token::Value(v))) => {
                    tokens.push(format!("--{name}"));
                    tokens.push(v.clone());
                }
                (ArgStyle::LongFlag, Some(Token::Switch)) => tokens.push(format!("--{name}")),
            }
        }
        tokens
    }

    pub fn build(&self) -> String {
        self.tokens().join(" ")
    }
}

impl fmt::Display for CommandBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.build())
    }
}

/// Render a float the way the remote interpreter prints it (`1.0`, `0.02`, `1e-05`).
pub fn format_float(v: f64) -> String {
    let repr = format!("{v:?}");
    match repr.split_once('e') {
        Some((mantissa, exp)) => {
            let exp: i32 = exp.parse().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{mantissa}e{sign}{:02}", exp.abs())
        }
        None => repr,
    }
}

/// Render a list as `[a,b,...]` with no spaces.
pub fn format_list(values: &[f64]) -> String {
    let items: Vec<String> = values.iter().map(|&v| format_float(v)).collect();
    format!("[{}]", items.join(","))
}
