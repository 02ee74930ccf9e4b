use crate::models::{ProblemFilter, Verdict, VerdictFilter};

/// One fully tokenized command from the input stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddTeam {
        name: String,
    },
    Start {
        duration_minutes: i64,
        problem_count: usize,
    },
    Submit {
        problem: String,
        team: String,
        verdict: Verdict,
        minute: i64,
    },
    Flush,
    Freeze,
    Scroll,
    QueryRanking {
        team: String,
    },
    QuerySubmission {
        team: String,
        problem: ProblemFilter,
        verdict: VerdictFilter,
    },
    End,
}

fn next_token<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    expected: &str,
) -> Result<&'a str, String> {
    tokens
        .next()
        .ok_or_else(|| format!("missing {expected}"))
}

fn expect_keyword<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    keyword: &str,
) -> Result<(), String> {
    let token = next_token(tokens, keyword)?;
    if token != keyword {
        return Err(format!("expected {keyword}, got {token}"));
    }
    Ok(())
}

fn parse_minutes(token: &str, what: &str) -> Result<i64, String> {
    let value: i64 = token
        .parse()
        .map_err(|_| format!("invalid {what}: {token}"))?;
    if value < 0 {
        return Err(format!("negative {what}: {token}"));
    }
    Ok(value)
}

pub fn parse_command(line: &str) -> Result<Command, String> {
    let mut tokens = line.split_whitespace();
    let keyword = next_token(&mut tokens, "command keyword")?;

    let command = match keyword {
        "ADDTEAM" => Command::AddTeam {
            name: next_token(&mut tokens, "team name")?.to_string(),
        },
        "START" => {
            expect_keyword(&mut tokens, "DURATION")?;
            let duration_minutes =
                parse_minutes(next_token(&mut tokens, "duration")?, "duration")?;
            expect_keyword(&mut tokens, "PROBLEM")?;
            let count_token = next_token(&mut tokens, "problem count")?;
            let problem_count: usize = count_token
                .parse()
                .map_err(|_| format!("invalid problem count: {count_token}"))?;
            if !(1..=26).contains(&problem_count) {
                return Err(format!("problem count out of range: {problem_count}"));
            }
            Command::Start {
                duration_minutes,
                problem_count,
            }
        }
        "SUBMIT" => {
            let problem = next_token(&mut tokens, "problem name")?.to_string();
            expect_keyword(&mut tokens, "BY")?;
            let team = next_token(&mut tokens, "team name")?.to_string();
            expect_keyword(&mut tokens, "WITH")?;
            let status_token = next_token(&mut tokens, "submit status")?;
            let verdict = Verdict::parse(status_token)
                .ok_or_else(|| format!("unknown submit status: {status_token}"))?;
            expect_keyword(&mut tokens, "AT")?;
            let minute = parse_minutes(next_token(&mut tokens, "submit time")?, "submit time")?;
            Command::Submit {
                problem,
                team,
                verdict,
                minute,
            }
        }
        "FLUSH" => Command::Flush,
        "FREEZE" => Command::Freeze,
        "SCROLL" => Command::Scroll,
        "QUERY_RANKING" => Command::QueryRanking {
            team: next_token(&mut tokens, "team name")?.to_string(),
        },
        "QUERY_SUBMISSION" => {
            let team = next_token(&mut tokens, "team name")?.to_string();
            expect_keyword(&mut tokens, "WHERE")?;
            let problem_clause = next_token(&mut tokens, "problem filter")?;
            let problem_token = problem_clause
                .strip_prefix("PROBLEM=")
                .ok_or_else(|| format!("expected PROBLEM=<name>, got {problem_clause}"))?;
            expect_keyword(&mut tokens, "AND")?;
            let status_clause = next_token(&mut tokens, "status filter")?;
            let status_token = status_clause
                .strip_prefix("STATUS=")
                .ok_or_else(|| format!("expected STATUS=<status>, got {status_clause}"))?;
            let verdict = VerdictFilter::parse(status_token)
                .ok_or_else(|| format!("unknown status filter: {status_token}"))?;
            Command::QuerySubmission {
                team,
                problem: ProblemFilter::parse(problem_token),
                verdict,
            }
        }
        "END" => Command::End,
        other => return Err(format!("unknown command: {other}")),
    };

    if let Some(extra) = tokens.next() {
        return Err(format!("unexpected trailing token: {extra}"));
    }

    Ok(command)
}
