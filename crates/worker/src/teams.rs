use courtline_core::domain::team::{all_abbreviations, full_name, normalize_abbreviation};

/// Teams to ingest: a comma-separated list from `--teams`, or the whole league.
pub fn resolve_teams(arg: Option<&str>) -> anyhow::Result<Vec<String>> {
    let Some(arg) = arg else {
        return Ok(all_abbreviations().map(str::to_string).collect());
    };

    let mut out: Vec<String> = Vec::new();
    for raw in arg.split(',') {
        let abbr = normalize_abbreviation(raw);
        if abbr.is_empty() {
            continue;
        }
        anyhow::ensure!(full_name(&abbr).is_some(), "unknown team abbreviation {abbr:?}");
        if !out.contains(&abbr) {
            out.push(abbr);
        }
    }
    anyhow::ensure!(!out.is_empty(), "--teams must name at least one team");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_whole_league() {
        let teams = resolve_teams(None).unwrap();
        assert_eq!(teams.len(), 30);
        assert!(teams.iter().any(|t| t == "OKC"));
    }

    #[test]
    fn normalizes_and_dedupes_list() {
        let teams = resolve_teams(Some(" bos,LAL,,Bos ")).unwrap();
        assert_eq!(teams, vec!["BOS".to_string(), "LAL".to_string()]);
    }

    #[test]
    fn rejects_unknown_or_empty_list() {
        assert!(resolve_teams(Some("BOS,XYZ")).is_err());
        assert!(resolve_teams(Some(" , ")).is_err());
    }
}
