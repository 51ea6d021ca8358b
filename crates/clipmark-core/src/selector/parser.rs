use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;
use thiserror::Error;

#[derive(Parser)]
#[grammar = "selector/css.pest"]
pub struct CssParser;

/// Errors that can occur while parsing a selector.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    /// Invalid selector syntax
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    /// Well-formed but outside the supported subset
    #[error("Unsupported selector: {0}")]
    Unsupported(String),
}

/// Comma-separated selector list. Matches when any member matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    pub selectors: Vec<ComplexSelector>,
}

/// Compounds joined by combinators, stored left to right:
/// `combinators[i]` sits between `compounds[i]` and `compounds[i + 1]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexSelector {
    pub compounds: Vec<CompoundSelector>,
    pub combinators: Vec<Combinator>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    Child,
    Descendant,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompoundSelector {
    /// Lower-cased type selector; `None` for `*` or no type at all.
    pub tag: Option<String>,
    pub conditions: Vec<Condition>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Id(String),
    Class(String),
    Attribute {
        name: String,
        matcher: Option<(AttrOp, String)>,
    },
    Nth {
        nth: Nth,
        of_type: bool,
        from_end: bool,
    },
    Root,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrOp {
    Equals,
    Includes,
    Prefix,
    Suffix,
    Substring,
    DashMatch,
}

/// `an+b` expression of the `:nth-*` pseudo-classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Nth {
    pub a: i32,
    pub b: i32,
}

impl Nth {
    pub const FIRST: Nth = Nth { a: 0, b: 1 };

    /// Whether the 1-based `index` is selected.
    pub fn matches(&self, index: i32) -> bool {
        let (a, b, index) = (i64::from(self.a), i64::from(self.b), i64::from(index));
        if a == 0 {
            return index == b;
        }
        let diff = index - b;
        diff % a == 0 && diff / a >= 0
    }
}

pub fn parse_selector(input: &str) -> Result<SelectorList, SelectorError> {
    let mut pairs = CssParser::parse(Rule::selector_list, input)
        .map_err(|e| SelectorError::InvalidSelector(format!("'{}': {}", input, e)))?;

    let mut selectors = Vec::new();
    if let Some(list) = pairs.next() {
        for pair in list.into_inner() {
            if pair.as_rule() == Rule::complex {
                selectors.push(parse_complex(pair)?);
            }
        }
    }

    Ok(SelectorList { selectors })
}

fn parse_complex(pair: Pair<Rule>) -> Result<ComplexSelector, SelectorError> {
    let mut compounds = Vec::new();
    let mut combinators = Vec::new();

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::compound => compounds.push(parse_compound(inner)?),
            Rule::child => combinators.push(Combinator::Child),
            Rule::descendant => combinators.push(Combinator::Descendant),
            rule => return Err(SelectorError::Unsupported(format!("{:?}", rule))),
        }
    }

    Ok(ComplexSelector {
        compounds,
        combinators,
    })
}

fn parse_compound(pair: Pair<Rule>) -> Result<CompoundSelector, SelectorError> {
    let mut compound = CompoundSelector::default();

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::universal => {}
            Rule::type_name => {
                compound.tag = Some(unescape_ident(inner.as_str()).to_ascii_lowercase());
            }
            Rule::id => compound.conditions.push(Condition::Id(first_ident(inner))),
            Rule::class => compound.conditions.push(Condition::Class(first_ident(inner))),
            Rule::attribute => compound.conditions.push(parse_attribute(inner)),
            Rule::nth_pseudo => compound.conditions.push(parse_nth_pseudo(inner)?),
            Rule::simple_pseudo => {
                push_simple_pseudo(&mut compound.conditions, inner.as_str())?;
            }
            rule => return Err(SelectorError::Unsupported(format!("{:?}", rule))),
        }
    }

    Ok(compound)
}

fn first_ident(pair: Pair<Rule>) -> String {
    pair.into_inner()
        .next()
        .map(|p| unescape_ident(p.as_str()))
        .unwrap_or_default()
}

fn parse_attribute(pair: Pair<Rule>) -> Condition {
    let mut name = String::new();
    let mut op = None;
    let mut value = None;

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::attr_name => name = first_ident(inner).to_ascii_lowercase(),
            Rule::attr_op => {
                op = Some(match inner.as_str() {
                    "~=" => AttrOp::Includes,
                    "^=" => AttrOp::Prefix,
                    "$=" => AttrOp::Suffix,
                    "*=" => AttrOp::Substring,
                    "|=" => AttrOp::DashMatch,
                    _ => AttrOp::Equals,
                })
            }
            Rule::ident_value => value = Some(first_ident(inner)),
            Rule::string => {
                value = Some(
                    inner
                        .into_inner()
                        .next()
                        .map(|p| unescape_string(p.as_str()))
                        .unwrap_or_default(),
                )
            }
            _ => {}
        }
    }

    Condition::Attribute {
        name,
        matcher: op.zip(value),
    }
}

fn parse_nth_pseudo(pair: Pair<Rule>) -> Result<Condition, SelectorError> {
    let mut inner = pair.into_inner();
    let name = inner
        .next()
        .map(|p| p.as_str().to_ascii_lowercase())
        .unwrap_or_default();
    let expr = inner.next().map(|p| p.as_str()).unwrap_or_default();
    let nth = parse_nth(expr)?;

    Ok(Condition::Nth {
        nth,
        of_type: name.ends_with("of-type"),
        from_end: name.starts_with("nth-last"),
    })
}

fn push_simple_pseudo(conditions: &mut Vec<Condition>, name: &str) -> Result<(), SelectorError> {
    let first = |of_type, from_end| Condition::Nth {
        nth: Nth::FIRST,
        of_type,
        from_end,
    };
    match name.to_ascii_lowercase().as_str() {
        "first-child" => conditions.push(first(false, false)),
        "last-child" => conditions.push(first(false, true)),
        "first-of-type" => conditions.push(first(true, false)),
        "last-of-type" => conditions.push(first(true, true)),
        "only-child" => conditions.extend([first(false, false), first(false, true)]),
        "only-of-type" => conditions.extend([first(true, false), first(true, true)]),
        "root" => conditions.push(Condition::Root),
        other => return Err(SelectorError::Unsupported(format!(":{}", other))),
    }
    Ok(())
}

/// Parse an `an+b` expression, `odd` or `even`.
pub fn parse_nth(expr: &str) -> Result<Nth, SelectorError> {
    let compact: String = expr
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    let invalid = || SelectorError::InvalidSelector(format!("bad nth expression '{}'", expr));

    match compact.as_str() {
        "odd" => return Ok(Nth { a: 2, b: 1 }),
        "even" => return Ok(Nth { a: 2, b: 0 }),
        _ => {}
    }

    match compact.split_once('n') {
        Some((a, b)) => {
            let a = match a {
                "" | "+" => 1,
                "-" => -1,
                _ => a.parse().map_err(|_| invalid())?,
            };
            let b = if b.is_empty() {
                0
            } else if b.starts_with(['+', '-']) {
                b.parse().map_err(|_| invalid())?
            } else {
                return Err(invalid());
            };
            Ok(Nth { a, b })
        }
        None => Ok(Nth {
            a: 0,
            b: compact.parse().map_err(|_| invalid())?,
        }),
    }
}

/// Resolve CSS escapes in an identifier.
pub fn unescape_ident(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        let mut hex = String::new();
        while hex.len() < 6 {
            match chars.peek() {
                Some(h) if h.is_ascii_hexdigit() => {
                    hex.push(*h);
                    chars.next();
                }
                _ => break,
            }
        }

        if hex.is_empty() {
            if let Some(next) = chars.next() {
                out.push(next);
            }
            continue;
        }

        let code = u32::from_str_radix(&hex, 16).unwrap_or(0xFFFD);
        let decoded = match char::from_u32(code) {
            Some('\0') | None => '\u{FFFD}',
            Some(ch) => ch,
        };
        out.push(decoded);

        // A single whitespace terminates the escape; CRLF counts as one.
        match chars.peek() {
            Some('\r') => {
                chars.next();
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            Some(' ' | '\t' | '\n') => {
                chars.next();
            }
            _ => {}
        }
    }

    out
}

/// Resolve escapes inside a quoted string; an escaped newline is a line
/// continuation.
pub fn unescape_string(raw: &str) -> String {
    unescape_ident(&raw.replace("\\\r\n", "").replace("\\\n", ""))
}
