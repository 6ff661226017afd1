use std::str::{FromStr, SplitAsciiWhitespace};

use derive_more::{Display, From};
use log::debug;
use serde::Deserialize;

use crate::problem::{Point, PoolSize, Problem, ProblemError, Slot};

#[derive(Debug, Display, From)]
pub enum ParseError {
    #[display(fmt = "unexpected end of input, expected {}", _0)]
    #[from(ignore)]
    UnexpectedEnd(&'static str),
    #[display(fmt = "invalid {}: {:?}", what, token)]
    #[from(ignore)]
    Invalid { what: &'static str, token: String },
    #[display(fmt = "unexpected trailing input: {:?}", _0)]
    #[from(ignore)]
    Trailing(String),
    #[display(fmt = "{}", _0)]
    Json(serde_json::Error),
    #[display(fmt = "{}", _0)]
    Problem(ProblemError),
}

impl std::error::Error for ParseError {}

struct Tokens<'s>(SplitAsciiWhitespace<'s>);

impl<'s> Tokens<'s> {
    fn next<T: FromStr>(&mut self, what: &'static str) -> Result<T, ParseError> {
        let token = self.0.next().ok_or(ParseError::UnexpectedEnd(what))?;
        token.parse().map_err(|_| ParseError::Invalid {
            what,
            token: token.to_string(),
        })
    }
}

/// Parses the whitespace separated text format:
///
/// ```text
/// A
/// x y            (A lines, one per agent home)
/// V
/// slot x y pool  (V lines, one per visit)
/// ```
pub fn parse_text(input: &str) -> Result<Problem, ParseError> {
    let mut tokens = Tokens(input.split_ascii_whitespace());

    let agents: usize = tokens.next("agent count")?;
    let mut homes = Vec::with_capacity(agents);
    for _ in 0..agents {
        let x = tokens.next("home x")?;
        let y = tokens.next("home y")?;
        homes.push(Point::new(x, y));
    }

    let visits: usize = tokens.next("visit count")?;
    let mut list = Vec::with_capacity(visits);
    for _ in 0..visits {
        let slot: Slot = tokens.next("visit slot")?;
        let x = tokens.next("visit x")?;
        let y = tokens.next("visit y")?;
        let pool: PoolSize = tokens.next("visit pool size")?;
        list.push((slot, Point::new(x, y), pool));
    }

    if let Some(token) = tokens.0.next() {
        return Err(ParseError::Trailing(token.to_string()));
    }

    debug!("Parsed {} agents and {} visits", agents, visits);
    Ok(Problem::new(homes, list)?)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct VisitInput {
    slot: Slot,
    x: f64,
    y: f64,
    pool_size: PoolSize,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProblemInput {
    agents: Vec<Point>,
    visits: Vec<VisitInput>,
}

/// Parses a problem given as JSON:
/// `{"agents": [{"x": 0, "y": 0}], "visits": [{"slot": 0, "x": 3, "y": 4, "pool_size": 10}]}`
pub fn parse_json(input: &str) -> Result<Problem, ParseError> {
    let input: ProblemInput = serde_json::from_str(input)?;
    let visits = input
        .visits
        .into_iter()
        .map(|v| (v.slot, Point::new(v.x, v.y), v.pool_size))
        .collect();

    Ok(Problem::new(input.agents, visits)?)
}
