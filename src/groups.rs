//! Group expressions
//!
//! Several properties select a set of objects by name or by group:
//!
//! ```text
//! host_name       web01,web02          # names
//! host_name       *,!web01             # every host except web01
//! hostgroup_name  linux&!(dmz|lab)     # linux hosts outside dmz and lab
//! ```
//!
//! The grammar is small:
//!
//! - `,` or `|` unions operands; inside a union, negated operands (`!x`) are
//!   exclusions applied to the union of the others (or to every known name when
//!   there are no others)
//! - `&` intersects operands
//! - `!` complements against the universe of known names
//! - `( ... )` groups
//! - `*` is every known name; words containing `*`, `?` or `[` are glob patterns
//!
//! A [`GroupIndex`] holds the universe of target names and the flattened
//! membership of each group. Unknown groups resolve to nothing and are reported
//! back to the caller.

use glob::Pattern;
use std::collections::{BTreeMap, BTreeSet};

/// How plain words of an expression are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leaf {
    /// Words are target names
    Names,
    /// Words are group names standing for their members
    Groups,
}

/// Outcome of evaluating an expression.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Selected names: literal names in written order, then the rest sorted
    pub names: Vec<String>,
    /// Group names that are not defined
    pub unknown: Vec<String>,
}

/// Target names and group membership used to evaluate expressions.
#[derive(Debug, Clone, Default)]
pub struct GroupIndex {
    universe: BTreeSet<String>,
    groups: BTreeMap<String, BTreeSet<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Or,
    And,
    Not,
    Open,
    Close,
    Word(String),
}

#[derive(Debug, Clone)]
enum Expr {
    All,
    Word(String),
    Not(Box<Expr>),
    And(Vec<Expr>),
    Or(Vec<Expr>),
}

impl GroupIndex {
    /// An index over `universe` without any group.
    pub fn new(universe: impl IntoIterator<Item = String>) -> Self {
        Self {
            universe: universe.into_iter().collect(),
            groups: BTreeMap::new(),
        }
    }

    /// Declare (or extend) a group.
    pub fn insert_group(&mut self, name: &str, members: impl IntoIterator<Item = String>) {
        self.groups.entry(name.to_string()).or_default().extend(members);
    }

    #[must_use]
    pub fn universe(&self) -> &BTreeSet<String> {
        &self.universe
    }

    #[must_use]
    pub fn members(&self, group: &str) -> Option<&BTreeSet<String>> {
        self.groups.get(group)
    }

    /// Evaluate `expression`, reading words as `leaf`.
    pub fn resolve(&self, expression: &str, leaf: Leaf) -> Result<Resolution, String> {
        self.resolve_with(expression, leaf, &[])
    }

    /// Evaluate `expression` with `base` names added to its top-level union.
    ///
    /// Exclusions written in the expression also apply to `base`.
    pub fn resolve_with(
        &self,
        expression: &str,
        leaf: Leaf,
        base: &[String],
    ) -> Result<Resolution, String> {
        let tokens = tokenize(expression);
        let mut pos = 0;
        let expr = parse_or(&tokens, &mut pos)?;
        if pos < tokens.len() {
            return Err(format!("unexpected ')' in expression '{expression}'"));
        }
        let expr = if base.is_empty() {
            expr
        } else {
            let mut operands = match expr {
                Expr::Or(operands) => operands,
                other => vec![other],
            };
            operands.extend(base.iter().map(|name| Expr::Word(name.clone())));
            Expr::Or(operands)
        };

        let mut unknown = Vec::new();
        let mut literals = Vec::new();
        let selected = self.eval(&expr, leaf, &mut unknown, &mut literals)?;

        let mut names: Vec<String> = Vec::new();
        for literal in literals {
            if selected.contains(&literal) && !names.contains(&literal) {
                names.push(literal);
            }
        }
        let rest: Vec<String> = selected.into_iter().filter(|n| !names.contains(n)).collect();
        names.extend(rest);
        unknown.dedup();

        Ok(Resolution { names, unknown })
    }

    fn eval(
        &self,
        expr: &Expr,
        leaf: Leaf,
        unknown: &mut Vec<String>,
        literals: &mut Vec<String>,
    ) -> Result<BTreeSet<String>, String> {
        Ok(match expr {
            Expr::All => self.universe.clone(),
            Expr::Word(word) => self.eval_word(word, leaf, unknown, literals)?,
            Expr::Not(inner) => {
                let excluded = self.eval(inner, leaf, unknown, literals)?;
                self.universe.difference(&excluded).cloned().collect()
            }
            Expr::And(operands) => {
                let mut result: Option<BTreeSet<String>> = None;
                for operand in operands {
                    let set = self.eval(operand, leaf, unknown, literals)?;
                    result = Some(match result {
                        Some(acc) => acc.intersection(&set).cloned().collect(),
                        None => set,
                    });
                }
                result.unwrap_or_default()
            }
            Expr::Or(operands) => {
                let mut included = BTreeSet::new();
                let mut excluded = BTreeSet::new();
                let mut positive = false;
                for operand in operands {
                    match operand {
                        Expr::Not(inner) => {
                            excluded.extend(self.eval(inner, leaf, unknown, literals)?);
                        }
                        other => {
                            positive = true;
                            included.extend(self.eval(other, leaf, unknown, literals)?);
                        }
                    }
                }
                if !positive && !excluded.is_empty() {
                    included = self.universe.clone();
                }
                included.difference(&excluded).cloned().collect()
            }
        })
    }

    fn eval_word(
        &self,
        word: &str,
        leaf: Leaf,
        unknown: &mut Vec<String>,
        literals: &mut Vec<String>,
    ) -> Result<BTreeSet<String>, String> {
        let is_pattern = word.contains(['*', '?', '[']);
        match leaf {
            Leaf::Names if is_pattern => {
                let pattern = compile(word)?;
                Ok(self.universe.iter().filter(|n| pattern.matches(n)).cloned().collect())
            }
            Leaf::Names => {
                literals.push(word.to_string());
                Ok(BTreeSet::from([word.to_string()]))
            }
            Leaf::Groups if is_pattern => {
                let pattern = compile(word)?;
                Ok(self
                    .groups
                    .iter()
                    .filter(|(name, _)| pattern.matches(name))
                    .flat_map(|(_, members)| members.iter().cloned())
                    .collect())
            }
            Leaf::Groups => match self.groups.get(word) {
                Some(members) => Ok(members.clone()),
                None => {
                    unknown.push(word.to_string());
                    Ok(BTreeSet::new())
                }
            },
        }
    }
}

fn compile(word: &str) -> Result<Pattern, String> {
    Pattern::new(word).map_err(|e| format!("invalid pattern '{word}': {e}"))
}

fn tokenize(expression: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    let flush = |word: &mut String, tokens: &mut Vec<Token>| {
        let trimmed = word.trim();
        if !trimmed.is_empty() {
            tokens.push(Token::Word(trimmed.to_string()));
        }
        word.clear();
    };

    for c in expression.chars() {
        let token = match c {
            ',' | '|' => Token::Or,
            '&' => Token::And,
            '!' => Token::Not,
            '(' => Token::Open,
            ')' => Token::Close,
            _ => {
                word.push(c);
                continue;
            }
        };
        flush(&mut word, &mut tokens);
        tokens.push(token);
    }
    flush(&mut word, &mut tokens);
    tokens
}

fn parse_or(tokens: &[Token], pos: &mut usize) -> Result<Expr, String> {
    let mut operands = Vec::new();
    loop {
        while tokens.get(*pos) == Some(&Token::Or) {
            *pos += 1;
        }
        match tokens.get(*pos) {
            None | Some(Token::Close) => break,
            Some(_) => operands.push(parse_and(tokens, pos)?),
        }
    }
    Ok(match operands.len() {
        1 if !matches!(operands[0], Expr::Not(_)) => operands.remove(0),
        _ => Expr::Or(operands),
    })
}

fn parse_and(tokens: &[Token], pos: &mut usize) -> Result<Expr, String> {
    let mut operands = vec![parse_not(tokens, pos)?];
    while tokens.get(*pos) == Some(&Token::And) {
        *pos += 1;
        operands.push(parse_not(tokens, pos)?);
    }
    Ok(if operands.len() == 1 { operands.remove(0) } else { Expr::And(operands) })
}

fn parse_not(tokens: &[Token], pos: &mut usize) -> Result<Expr, String> {
    match tokens.get(*pos) {
        Some(Token::Not) => {
            *pos += 1;
            Ok(Expr::Not(Box::new(parse_not(tokens, pos)?)))
        }
        Some(Token::Open) => {
            *pos += 1;
            let inner = parse_or(tokens, pos)?;
            if tokens.get(*pos) != Some(&Token::Close) {
                return Err("missing ')' in expression".to_string());
            }
            *pos += 1;
            Ok(inner)
        }
        Some(Token::Word(word)) => {
            *pos += 1;
            Ok(if word == "*" { Expr::All } else { Expr::Word(word.clone()) })
        }
        Some(token) => Err(format!("unexpected {token:?} in expression")),
        None => Err("expression ends with an operator".to_string()),
    }
}
