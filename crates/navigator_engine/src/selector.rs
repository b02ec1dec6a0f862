//! Small CSS selector subset used to describe host markup in configuration.
//!
//! Supported: `tag`, `*`, `.class`, `#id`, `[attr]`, `[attr=value]`,
//! `[attr^=value]`, `[attr*=value]`, the descendant combinator and `,` groups.
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::dom::{Document, ElementData, NodeId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid selector {selector:?}: {reason}")]
pub struct SelectorError {
    pub selector: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrOp {
    Exists,
    Equals(String),
    Prefix(String),
    Contains(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrTest {
    name: String,
    op: AttrOp,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrTest>,
}

impl Compound {
    fn matches(&self, element: &ElementData) -> bool {
        if let Some(tag) = &self.tag {
            if element.name() != tag {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if element.attr("id") != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|class| element.has_class(class)) {
            return false;
        }
        self.attrs.iter().all(|test| {
            let Some(value) = element.attr(&test.name) else {
                return false;
            };
            match &test.op {
                AttrOp::Exists => true,
                AttrOp::Equals(expected) => value == expected,
                AttrOp::Prefix(prefix) => value.starts_with(prefix.as_str()),
                AttrOp::Contains(needle) => value.contains(needle.as_str()),
            }
        })
    }
}

/// A parsed selector group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    // Each alternative is a descendant chain, outermost first.
    alternatives: Vec<Vec<Compound>>,
}

impl Selector {
    pub fn parse(source: &str) -> Result<Self, SelectorError> {
        let fail = |reason: &str| SelectorError {
            selector: source.to_string(),
            reason: reason.to_string(),
        };
        let mut alternatives = Vec::new();
        for group in split_groups(source).map_err(|reason| fail(&reason))? {
            let chain = parse_chain(&group).map_err(|reason| fail(&reason))?;
            if chain.is_empty() {
                return Err(fail("empty selector"));
            }
            alternatives.push(chain);
        }
        if alternatives.is_empty() {
            return Err(fail("empty selector"));
        }
        Ok(Self {
            source: source.to_string(),
            alternatives,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        self.alternatives
            .iter()
            .any(|chain| chain_matches(chain, doc, node))
    }

    /// Matching descendants of `scope` (not `scope` itself), in document order.
    pub fn select(&self, doc: &Document, scope: NodeId) -> Vec<NodeId> {
        doc.descendant_elements(scope)
            .into_iter()
            .filter(|node| self.matches(doc, *node))
            .collect()
    }

    pub fn select_first(&self, doc: &Document, scope: NodeId) -> Option<NodeId> {
        doc.descendant_elements(scope)
            .into_iter()
            .find(|node| self.matches(doc, *node))
    }

    /// Nearest inclusive ancestor matching the selector.
    pub fn closest(&self, doc: &Document, node: NodeId) -> Option<NodeId> {
        if doc.is_element(node) && self.matches(doc, node) {
            return Some(node);
        }
        doc.ancestor_elements(node)
            .into_iter()
            .find(|ancestor| self.matches(doc, *ancestor))
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Ordered fallback chain: the first selector that matches anything wins.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectorList {
    selectors: Vec<Selector>,
}

impl SelectorList {
    pub fn parse<S: AsRef<str>>(sources: &[S]) -> Result<Self, SelectorError> {
        let selectors = sources
            .iter()
            .map(|source| Selector::parse(source.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { selectors })
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    /// Matches of the first selector with any match, and that selector.
    pub fn select_first_nonempty(&self, doc: &Document, scope: NodeId) -> Option<(&Selector, Vec<NodeId>)> {
        self.selectors.iter().find_map(|selector| {
            let found = selector.select(doc, scope);
            (!found.is_empty()).then_some((selector, found))
        })
    }

    pub fn first(&self, doc: &Document, scope: NodeId) -> Option<NodeId> {
        self.selectors
            .iter()
            .find_map(|selector| selector.select_first(doc, scope))
    }

    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        self.selectors.iter().any(|selector| selector.matches(doc, node))
    }
}

fn chain_matches(chain: &[Compound], doc: &Document, node: NodeId) -> bool {
    let Some((last, rest)) = chain.split_last() else {
        return false;
    };
    let Some(element) = doc.element(node) else {
        return false;
    };
    if !last.matches(element) {
        return false;
    }
    // Descendant-only chains can be matched greedily from the nearest ancestor.
    let mut pending = rest.iter().rev().peekable();
    for ancestor in doc.ancestor_elements(node) {
        let Some(compound) = pending.peek() else {
            break;
        };
        if doc.element(ancestor).is_some_and(|data| compound.matches(data)) {
            pending.next();
        }
    }
    pending.peek().is_none()
}

fn split_groups(source: &str) -> Result<Vec<String>, String> {
    let mut groups = Vec::new();
    let mut current = String::new();
    let mut in_brackets = false;
    let mut quote: Option<char> = None;
    for ch in source.chars() {
        match ch {
            '"' | '\'' if quote == Some(ch) => quote = None,
            '"' | '\'' if quote.is_none() && in_brackets => quote = Some(ch),
            '[' if quote.is_none() => in_brackets = true,
            ']' if quote.is_none() => in_brackets = false,
            ',' if quote.is_none() && !in_brackets => {
                groups.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        current.push(ch);
    }
    if quote.is_some() || in_brackets {
        return Err("unterminated attribute selector".to_string());
    }
    groups.push(current);
    Ok(groups.into_iter().map(|g| g.trim().to_string()).collect())
}

fn parse_chain(source: &str) -> Result<Vec<Compound>, String> {
    let chars: Vec<char> = source.chars().collect();
    let mut pos = 0;
    let mut chain = Vec::new();
    while pos < chars.len() {
        if chars[pos].is_whitespace() {
            pos += 1;
            continue;
        }
        let (compound, next) = parse_compound(&chars, pos)?;
        chain.push(compound);
        pos = next;
    }
    Ok(chain)
}

fn parse_compound(chars: &[char], mut pos: usize) -> Result<(Compound, usize), String> {
    let mut compound = Compound::default();
    let start = pos;
    if chars.get(pos) == Some(&'*') {
        pos += 1;
    } else {
        let (name, next) = read_ident(chars, pos);
        if !name.is_empty() {
            compound.tag = Some(name.to_ascii_lowercase());
            pos = next;
        }
    }
    while let Some(&ch) = chars.get(pos) {
        match ch {
            '.' => {
                let (name, next) = read_ident(chars, pos + 1);
                if name.is_empty() {
                    return Err("expected class name after '.'".to_string());
                }
                compound.classes.push(name);
                pos = next;
            }
            '#' => {
                let (name, next) = read_ident(chars, pos + 1);
                if name.is_empty() {
                    return Err("expected id after '#'".to_string());
                }
                compound.id = Some(name);
                pos = next;
            }
            '[' => {
                let (test, next) = parse_attr(chars, pos + 1)?;
                compound.attrs.push(test);
                pos = next;
            }
            c if c.is_whitespace() => break,
            other => return Err(format!("unexpected character {other:?}")),
        }
    }
    if pos == start {
        return Err("expected a selector".to_string());
    }
    Ok((compound, pos))
}

fn parse_attr(chars: &[char], pos: usize) -> Result<(AttrTest, usize), String> {
    let mut pos = skip_ws(chars, pos);
    let (name, next) = read_ident(chars, pos);
    if name.is_empty() {
        return Err("expected attribute name".to_string());
    }
    pos = skip_ws(chars, next);
    let op: fn(String) -> AttrOp = match chars.get(pos) {
        Some(']') => return Ok((AttrTest { name, op: AttrOp::Exists }, pos + 1)),
        Some('=') => {
            pos += 1;
            AttrOp::Equals
        }
        Some('^') if chars.get(pos + 1) == Some(&'=') => {
            pos += 2;
            AttrOp::Prefix
        }
        Some('*') if chars.get(pos + 1) == Some(&'=') => {
            pos += 2;
            AttrOp::Contains
        }
        _ => return Err(format!("unsupported attribute operator in [{name}")),
    };
    pos = skip_ws(chars, pos);
    let value = match chars.get(pos) {
        Some(&quote) if quote == '"' || quote == '\'' => {
            let end = chars[pos + 1..]
                .iter()
                .position(|&c| c == quote)
                .ok_or_else(|| "unterminated string".to_string())?;
            let value: String = chars[pos + 1..pos + 1 + end].iter().collect();
            pos += end + 2;
            value
        }
        _ => {
            let (value, next) = read_ident(chars, pos);
            pos = next;
            value
        }
    };
    pos = skip_ws(chars, pos);
    if chars.get(pos) != Some(&']') {
        return Err(format!("expected ']' after [{name}"));
    }
    Ok((AttrTest { name, op: op(value) }, pos + 1))
}

fn read_ident(chars: &[char], pos: usize) -> (String, usize) {
    let mut end = pos;
    while end < chars.len() && (chars[end].is_alphanumeric() || chars[end] == '-' || chars[end] == '_') {
        end += 1;
    }
    (chars[pos.min(chars.len())..end].iter().collect(), end)
}

fn skip_ws(chars: &[char], mut pos: usize) -> usize {
    while pos < chars.len() && chars[pos].is_whitespace() {
        pos += 1;
    }
    pos
}
