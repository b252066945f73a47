//! # Member-Path Expressions
//!
//! User type definitions locate sub-values relative to the variable being
//! drawn: `pts`, `m_impl.points`, `buffer[first]`. A [`MemberPath`] keeps
//! such a path as tokens and rewrites it against a concrete root variable:
//!
//! ```rust
//! use geoscope_core::expression::MemberPath;
//!
//! let path = MemberPath::parse("data.points[offset]");
//! assert_eq!(path.resolve("shape"), "shape.data.points[shape.offset]");
//! assert_eq!(path.resolve("v[2]"), "v[2].data.points[v[2].offset]");
//! assert_eq!(path.resolve("*ptr"), "(*ptr).data.points[(*ptr).offset]");
//! ```
//!
//! Identifiers that start an access chain are assumed to be members of the
//! root. [`MemberPath::initialize`] asks the session which of them really
//! are, so globals and constants used inside a path stay untouched.

use tracing::trace;

use crate::session::DebugSession;

const KEYWORDS: [&str; 22] = [
    "this",
    "sizeof",
    "alignof",
    "true",
    "false",
    "nullptr",
    "NULL",
    "null",
    "static_cast",
    "reinterpret_cast",
    "const_cast",
    "dynamic_cast",
    "const",
    "volatile",
    "unsigned",
    "signed",
    "int",
    "long",
    "short",
    "char",
    "float",
    "double",
];

#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenKind
{
    /// Identifier that may name a member of the root
    Candidate,
    /// Anything copied verbatim
    Verbatim,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Token
{
    text: String,
    kind: TokenKind,
}

/// Access path relative to a root variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberPath
{
    text: String,
    tokens: Vec<Token>,
}

/// Which leading identifiers of a path are members of a particular root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberScope
{
    members: Vec<bool>,
}

impl MemberScope
{
    /// Scope treating every leading identifier as a member.
    #[must_use]
    pub fn all(count: usize) -> Self
    {
        Self {
            members: vec![true; count],
        }
    }

    /// Whether the `index`-th leading identifier is a member.
    #[must_use]
    pub fn is_member(&self, index: usize) -> bool
    {
        self.members.get(index).copied().unwrap_or(true)
    }
}

impl MemberPath
{
    /// Tokenize a path.
    #[must_use]
    pub fn parse(text: &str) -> Self
    {
        let text = text.trim();
        let mut tokens = lex(text);
        mark_candidates(&mut tokens);
        Self {
            text: text.to_string(),
            tokens,
        }
    }

    /// The path as written.
    #[must_use]
    pub fn as_str(&self) -> &str
    {
        &self.text
    }

    /// Whether the path is empty (the root itself).
    #[must_use]
    pub fn is_empty(&self) -> bool
    {
        self.tokens.is_empty()
    }

    /// Identifiers that start an access chain, in order.
    pub fn candidates(&self) -> impl Iterator<Item = &str>
    {
        self.tokens
            .iter()
            .filter(|token| token.kind == TokenKind::Candidate)
            .map(|token| token.text.as_str())
    }

    /// Determine which leading identifiers are members of `root`.
    ///
    /// An identifier is a member when `root.identifier` evaluates. When the
    /// root's type is unknown the session cannot answer, and every
    /// identifier is assumed to be a member.
    pub fn initialize(&self, session: &dyn DebugSession, root: &str, type_name: Option<&str>) -> MemberScope
    {
        let count = self.candidates().count();
        let Some(type_name) = type_name else {
            return MemberScope::all(count);
        };

        let members = self
            .candidates()
            .map(|identifier| {
                let valid = session.evaluate(&member_access(root, identifier)).valid;
                if !valid {
                    trace!(root, type_name, identifier, "not a member, left unqualified");
                }
                valid
            })
            .collect();
        MemberScope { members }
    }

    /// Rewrite the path against `root`, treating every leading identifier as a member.
    #[must_use]
    pub fn resolve(&self, root: &str) -> String
    {
        self.resolve_in(root, &MemberScope::all(self.candidates().count()))
    }

    /// Rewrite the path against `root` using a scope from [`initialize`](Self::initialize).
    #[must_use]
    pub fn resolve_in(&self, root: &str, scope: &MemberScope) -> String
    {
        if self.tokens.is_empty() {
            return root.to_string();
        }

        let mut resolved = String::with_capacity(self.text.len() + root.len());
        let mut candidate = 0;
        for token in &self.tokens {
            match token.kind {
                TokenKind::Candidate => {
                    if scope.is_member(candidate) {
                        resolved.push_str(&member_access(root, &token.text));
                    } else {
                        resolved.push_str(&token.text);
                    }
                    candidate += 1;
                }
                TokenKind::Verbatim => resolved.push_str(&token.text),
            }
        }
        resolved
    }
}

/// Expression accessing `member` of `root`.
///
/// Roots that are more than a plain access chain are parenthesized.
///
/// ```rust
/// use geoscope_core::expression::member_access;
///
/// assert_eq!(member_access("p", "x"), "p.x");
/// assert_eq!(member_access("a->b[3]", "x"), "a->b[3].x");
/// assert_eq!(member_access("*it", "x"), "(*it).x");
/// ```
#[must_use]
pub fn member_access(root: &str, member: &str) -> String
{
    let root = root.trim();
    let simple = root
        .chars()
        .all(|ch| ch.is_alphanumeric() || matches!(ch, '_' | '.' | ':' | '[' | ']' | '-' | '>'));
    if simple {
        format!("{root}.{member}")
    } else {
        format!("({root}).{member}")
    }
}

fn lex(text: &str) -> Vec<Token>
{
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut index = 0;
    while index < chars.len() {
        let start = index;
        let ch = chars[index];
        let is_identifier = ch.is_alphabetic() || ch == '_';
        if is_identifier || ch.is_ascii_digit() {
            // numbers swallow suffixes and fractions (1.5f, 0x10)
            index += 1;
            while index < chars.len()
                && (chars[index].is_alphanumeric() || chars[index] == '_' || (!is_identifier && chars[index] == '.'))
            {
                index += 1;
            }
        } else if ch.is_whitespace() {
            while index < chars.len() && chars[index].is_whitespace() {
                index += 1;
            }
        } else if matches!((ch, chars.get(index + 1)), ('-', Some('>')) | (':', Some(':'))) {
            index += 2;
        } else {
            index += 1;
        }

        let text: String = chars[start..index].iter().collect();
        let kind = if is_identifier && !KEYWORDS.contains(&text.as_str()) {
            TokenKind::Candidate
        } else {
            TokenKind::Verbatim
        };
        tokens.push(Token { text, kind });
    }
    tokens
}

fn mark_candidates(tokens: &mut [Token])
{
    let significant = |token: &Token| !token.text.chars().all(char::is_whitespace);

    for index in 0..tokens.len() {
        if tokens[index].kind != TokenKind::Candidate {
            continue;
        }
        let previous = tokens[..index].iter().rev().find(|token| significant(token));
        let next = tokens[index + 1..].iter().find(|token| significant(token));

        let follows_access = previous.is_some_and(|token| matches!(token.text.as_str(), "." | "->" | "::"));
        let qualifies = next.is_some_and(|token| token.text == "::");
        if follows_access || qualifies {
            tokens[index].kind = TokenKind::Verbatim;
        }
    }
}
