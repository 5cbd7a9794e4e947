use crate::domain::game::{GameOutcome, GameRecord};
use anyhow::{bail, Context};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

const COLUMNS: [&str; 17] = [
    "TEAM_ABBREVIATION",
    "GAME_ID",
    "GAME_DATE",
    "MATCHUP",
    "WL",
    "PTS",
    "FGM",
    "FGA",
    "FG_PCT",
    "FG3M",
    "FG3A",
    "FTM",
    "FTA",
    "OREB",
    "REB",
    "TOV",
    "OPP_PTS",
];

pub fn read_game_logs(path: &Path) -> anyhow::Result<Vec<GameRecord>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read game logs file {}", path.display()))?;
    parse_game_logs(&text).with_context(|| format!("invalid game logs file {}", path.display()))
}

/// Parses a header-addressed game-log table. Columns are looked up by name, so
/// wider exports from the stats feed load as long as the required ones exist.
pub fn parse_game_logs(text: &str) -> anyhow::Result<Vec<GameRecord>> {
    let mut lines = text.lines().enumerate().filter(|(_, l)| !l.trim().is_empty());
    let Some((_, header)) = lines.next() else {
        return Ok(Vec::new());
    };

    let index: HashMap<String, usize> = split_line(header)
        .into_iter()
        .enumerate()
        .map(|(i, name)| (name.trim().to_ascii_uppercase(), i))
        .collect();

    let mut out = Vec::new();
    for (line_no, line) in lines {
        let fields = split_line(line);
        let row = Row {
            index: &index,
            fields: &fields,
        };
        let record = parse_row(&row).with_context(|| format!("line {}", line_no + 1))?;
        out.push(record);
    }
    Ok(out)
}

pub fn write_game_logs(path: &Path, records: &[GameRecord]) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let mut w = std::io::BufWriter::new(file);

    writeln!(w, "{}", COLUMNS.join(","))?;
    for r in records {
        writeln!(
            w,
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
            quote(&r.team),
            quote(&r.game_id),
            r.game_date.format("%Y-%m-%d"),
            quote(&r.matchup),
            r.wl.as_str(),
            r.pts,
            r.fgm,
            r.fga,
            r.fg_pct,
            r.fg3m,
            r.fg3a,
            r.ftm,
            r.fta,
            r.oreb,
            r.reb,
            r.tov,
            r.opp_pts.map(|v| v.to_string()).unwrap_or_default(),
        )?;
    }
    w.flush().context("failed to flush game logs file")?;
    Ok(())
}

struct Row<'a> {
    index: &'a HashMap<String, usize>,
    fields: &'a [String],
}

impl Row<'_> {
    fn get(&self, col: &str) -> Option<&str> {
        let i = *self.index.get(col)?;
        self.fields
            .get(i)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    fn text(&self, col: &str) -> anyhow::Result<&str> {
        self.get(col).with_context(|| format!("missing {col}"))
    }

    fn number(&self, col: &str) -> anyhow::Result<f64> {
        let s = self.text(col)?;
        s.parse::<f64>()
            .with_context(|| format!("{col} is not numeric: {s:?}"))
    }

    fn optional_number(&self, col: &str) -> anyhow::Result<Option<f64>> {
        self.get(col)
            .map(|s| {
                s.parse::<f64>()
                    .with_context(|| format!("{col} is not numeric: {s:?}"))
            })
            .transpose()
    }
}

fn parse_row(row: &Row<'_>) -> anyhow::Result<GameRecord> {
    let wl_raw = row.text("WL")?;
    let Some(wl) = GameOutcome::parse(wl_raw) else {
        bail!("WL must be W or L (got {wl_raw:?})");
    };

    let fgm = row.number("FGM")?;
    let fga = row.number("FGA")?;
    let fg_pct = match row.optional_number("FG_PCT")? {
        Some(v) => v,
        None if fga > 0.0 => fgm / fga,
        None => 0.0,
    };

    Ok(GameRecord {
        team: row.text("TEAM_ABBREVIATION")?.to_string(),
        game_id: row.text("GAME_ID")?.to_string(),
        game_date: parse_game_date(row.text("GAME_DATE")?)?,
        matchup: row.get("MATCHUP").unwrap_or_default().to_string(),
        wl,
        pts: row.number("PTS")?,
        fgm,
        fga,
        fg_pct,
        fg3m: row.optional_number("FG3M")?.unwrap_or(0.0),
        fg3a: row.optional_number("FG3A")?.unwrap_or(0.0),
        ftm: row.optional_number("FTM")?.unwrap_or(0.0),
        fta: row.number("FTA")?,
        oreb: row.number("OREB")?,
        reb: row.number("REB")?,
        tov: row.number("TOV")?,
        opp_pts: row.optional_number("OPP_PTS")?,
        rest_days: None,
    })
}

/// Accepts ISO dates and the stats feed's `APR 13, 2025` form.
pub fn parse_game_date(s: &str) -> anyhow::Result<NaiveDate> {
    let s = s.trim();
    let date_part = s.split(['T', ' ']).next().unwrap_or(s);
    if let Ok(d) = NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
        return Ok(d);
    }
    NaiveDate::parse_from_str(s, "%b %d, %Y")
        .with_context(|| format!("unrecognized GAME_DATE {s:?}"))
}

fn split_line(line: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut cur = String::new();
    let mut in_quotes = false;
    let mut chars = line.trim_end_matches('\r').chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                cur.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => out.push(std::mem::take(&mut cur)),
            _ => cur.push(c),
        }
    }
    out.push(cur);
    out
}

fn quote(s: &str) -> String {
    if s.contains([',', '"', '\n']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_stats_feed_export_with_extra_columns() {
        let text = "\
Team_ID,Game_ID,GAME_DATE,MATCHUP,WL,W,L,MIN,FGM,FGA,FG_PCT,FG3M,FG3A,FTM,FTA,OREB,DREB,REB,AST,TOV,PTS,TEAM_ABBREVIATION
1610612738,0022401190,\"APR 13, 2025\",BOS vs. CHA,W,61,21,240,45,90,0.5,16,40,17,20,9,36,45,28,11,123,BOS
";
        let records = parse_game_logs(text).unwrap();
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.team, "BOS");
        assert_eq!(r.game_date, NaiveDate::from_ymd_opt(2025, 4, 13).unwrap());
        assert_eq!(r.wl, GameOutcome::Win);
        assert_eq!(r.pts, 123.0);
        assert_eq!(r.opp_pts, None);
    }

    #[test]
    fn reports_line_of_bad_row() {
        let text = "\
TEAM_ABBREVIATION,GAME_ID,GAME_DATE,WL,PTS,FGM,FGA,FTA,OREB,REB,TOV
BOS,g1,2025-01-02,W,110,40,88,20,10,44,13
BOS,g2,2025-01-04,X,110,40,88,20,10,44,13
";
        let err = parse_game_logs(text).unwrap_err();
        assert!(format!("{err:#}").contains("line 3"));
    }

    #[test]
    fn missing_fg_pct_is_derived() {
        let text = "\
TEAM_ABBREVIATION,GAME_ID,GAME_DATE,WL,PTS,FGM,FGA,FTA,OREB,REB,TOV
BOS,g1,2025-01-02,L,100,40,80,20,10,44,13
";
        let records = parse_game_logs(text).unwrap();
        assert!((records[0].fg_pct - 0.5).abs() < 1e-12);
    }

    #[test]
    fn splits_quoted_fields() {
        assert_eq!(
            split_line("a,\"b, c\",\"d \"\"e\"\"\""),
            vec!["a", "b, c", "d \"e\""]
        );
        assert_eq!(quote("BOS @ LAL, late"), "\"BOS @ LAL, late\"");
    }

    #[test]
    fn written_logs_read_back_unchanged() {
        use crate::domain::game::fixtures::game;

        let date = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        let mut home = game("BOS", "0022400501", date, GameOutcome::Win, 118.0);
        home.matchup = "BOS vs. LAL, \"late\"".to_string();
        home.opp_pts = Some(104.0);
        let away = game("LAL", "0022400501", date, GameOutcome::Loss, 104.0);

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("team_game_logs.csv");
        write_game_logs(&path, &[home.clone(), away.clone()]).unwrap();

        let back = read_game_logs(&path).unwrap();
        assert_eq!(back, vec![home, away]);
    }
}
