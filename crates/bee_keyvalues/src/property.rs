use crate::error::{ParseError, ParseErrorKind};
use crate::lexer::{Lexer, Token};

/// The payload of a [`Property`]: either a single string or a list of children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Leaf(String),
    Block(Vec<Property>),
}

/// A node of a property tree.
///
/// Names are matched case-insensitively and may repeat inside a block. The
/// tree returned by [`Property::parse`] is an unnamed root block whose
/// children are the top-level properties of the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    name: Option<String>,
    value: Value,
}

impl Property {
    pub fn leaf(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            value: Value::Leaf(value.into()),
        }
    }

    pub fn block(name: impl Into<String>, children: Vec<Property>) -> Self {
        Self {
            name: Some(name.into()),
            value: Value::Block(children),
        }
    }

    /// An unnamed block. Exporting it writes only its children.
    pub fn root(children: Vec<Property>) -> Self {
        Self {
            name: None,
            value: Value::Block(children),
        }
    }

    /// Parse property text. `source_name` is only used in error messages.
    pub fn parse(text: &str, source_name: &str) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(text);
        let children = parse_block(&mut lexer, None).map_err(|(kind, line)| ParseError {
            source_name: source_name.to_string(),
            line,
            kind,
        })?;
        Ok(Self::root(children))
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// The string value of a leaf, `None` for blocks.
    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            Value::Leaf(s) => Some(s),
            Value::Block(_) => None,
        }
    }

    pub fn is_block(&self) -> bool {
        matches!(self.value, Value::Block(_))
    }

    /// Children of a block. Leaves have none.
    pub fn children(&self) -> &[Property] {
        match &self.value {
            Value::Block(children) => children,
            Value::Leaf(_) => &[],
        }
    }

    /// Whether the property carries anything: a non-empty string or a
    /// block with at least one child.
    pub fn is_truthy(&self) -> bool {
        match &self.value {
            Value::Leaf(s) => !s.is_empty(),
            Value::Block(children) => !children.is_empty(),
        }
    }

    /// Append a child. A leaf is turned into an empty block first.
    pub fn push(&mut self, child: Property) {
        match &mut self.value {
            Value::Block(children) => children.push(child),
            Value::Leaf(_) => self.value = Value::Block(vec![child]),
        }
    }

    fn name_matches(&self, name: &str) -> bool {
        self.name
            .as_deref()
            .is_some_and(|own| own.eq_ignore_ascii_case(name))
    }

    /// First child with the given name.
    pub fn find_key(&self, name: &str) -> Option<&Property> {
        self.children().iter().find(|child| child.name_matches(name))
    }

    /// All children with the given name, in order.
    pub fn find_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Property> + 'a {
        self.children()
            .iter()
            .filter(move |child| child.name_matches(name))
    }

    /// First child block with the given name.
    pub fn find_block(&self, name: &str) -> Option<&Property> {
        self.children()
            .iter()
            .find(|child| child.is_block() && child.name_matches(name))
    }

    /// String value of the first leaf child with the given name, or `default`.
    pub fn value_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.children()
            .iter()
            .filter(|child| child.name_matches(name))
            .find_map(Property::as_str)
            .unwrap_or(default)
    }

    /// Serialise back to text.
    pub fn export(&self) -> String {
        let mut out = String::new();
        match &self.name {
            Some(_) => self.export_into(&mut out, 0),
            None => {
                for child in self.children() {
                    child.export_into(&mut out, 0);
                }
            }
        }
        out
    }

    fn export_into(&self, out: &mut String, depth: usize) {
        let indent = "\t".repeat(depth);
        let name = self.name.as_deref().unwrap_or_default();
        match &self.value {
            Value::Leaf(value) => {
                out.push_str(&format!("{indent}\"{name}\" \"{value}\"\n"));
            }
            Value::Block(children) => {
                out.push_str(&format!("{indent}\"{name}\"\n"));
                out.push_str(&format!("{indent}\t{{\n"));
                for child in children {
                    child.export_into(out, depth + 1);
                }
                out.push_str(&format!("{indent}\t}}\n"));
            }
        }
    }
}

type Located<T> = Result<T, (ParseErrorKind, usize)>;

fn parse_block(lexer: &mut Lexer<'_>, opened_on: Option<usize>) -> Located<Vec<Property>> {
    let mut props = Vec::new();

    loop {
        let Some((token, line)) = lexer.next_token()? else {
            return match opened_on {
                Some(open_line) => Err((ParseErrorKind::UnclosedBlock(open_line), open_line)),
                None => Ok(props),
            };
        };

        let key = match token {
            Token::Text(key) => key,
            Token::Flag => continue,
            Token::Close if opened_on.is_some() => return Ok(props),
            Token::Close => return Err((ParseErrorKind::UnexpectedClose, line)),
            Token::Open => return Err((ParseErrorKind::UnexpectedOpen, line)),
        };

        let value = loop {
            match lexer.next_token()? {
                Some((Token::Flag, _)) => continue,
                Some((Token::Text(value), _)) => break Value::Leaf(value),
                Some((Token::Open, open_line)) => {
                    break Value::Block(parse_block(lexer, Some(open_line))?)
                }
                Some((Token::Close, _)) | None => {
                    return Err((ParseErrorKind::MissingValue(key), line));
                }
            }
        };

        props.push(Property {
            name: Some(key),
            value,
        });
    }
}

/// Interpret a config string as a boolean. Unknown text yields `default`.
pub fn conv_bool(text: &str, default: bool) -> bool {
    match text.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => true,
        "0" | "false" | "no" | "n" | "off" => false,
        _ => default,
    }
}
