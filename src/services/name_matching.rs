use crate::schemas::roster::Roster;

const MAX_CANDIDATES: usize = 3;

/// Keeps ASCII letters and whitespace only, with whitespace runs collapsed.
pub(crate) fn normalize_name(raw: &str) -> String {
    let letters: String =
        raw.chars().filter(|ch| ch.is_ascii_alphabetic() || ch.is_whitespace()).collect();
    letters.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// One name per line of OCR output. Lines that are empty once normalized are
/// dropped.
pub(crate) fn extract_names(ocr_text: &str) -> Vec<String> {
    ocr_text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(normalize_name)
        .filter(|name| !name.is_empty())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MatchedName {
    pub(crate) extracted: String,
    pub(crate) roll_number: String,
}

/// A name read from the sheet that is not on the roster, waiting for a
/// decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PendingName {
    pub(crate) extracted: String,
    /// Closest roster names, best first.
    pub(crate) candidates: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Reconciliation {
    pub(crate) matched: Vec<MatchedName>,
    pub(crate) pending: Vec<PendingName>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Resolution {
    Roster(String),
    Skip,
}

/// Decides what an unrecognized name refers to.
pub(crate) trait NameResolver {
    fn resolve(&mut self, pending: &PendingName, roster: &Roster) -> anyhow::Result<Resolution>;
}

/// Skips every unrecognized name.
#[derive(Debug, Default)]
pub(crate) struct SkipResolver;

impl NameResolver for SkipResolver {
    fn resolve(&mut self, pending: &PendingName, _roster: &Roster) -> anyhow::Result<Resolution> {
        tracing::info!(name = %pending.extracted, "Skipping unrecognized name");
        Ok(Resolution::Skip)
    }
}

/// Exact roster lookup for every name. Nothing is matched fuzzily; names
/// without an exact hit come back as pending with suggestions.
pub(crate) fn reconcile(names: &[String], roster: &Roster) -> Reconciliation {
    let mut reconciliation = Reconciliation::default();

    for name in names {
        match roster.roll_number_for(name) {
            Some(roll_number) => reconciliation.matched.push(MatchedName {
                extracted: name.clone(),
                roll_number: roll_number.to_string(),
            }),
            None => reconciliation.pending.push(PendingName {
                extracted: name.clone(),
                candidates: suggest_candidates(name, roster),
            }),
        }
    }

    reconciliation
}

fn suggest_candidates(name: &str, roster: &Roster) -> Vec<String> {
    let needle = name.to_lowercase();
    let mut scored: Vec<(usize, &str)> = roster
        .names()
        .filter_map(|candidate| {
            let distance = edit_distance(&needle, &candidate.to_lowercase());
            let limit = needle.chars().count().max(candidate.chars().count()) / 2;
            (distance <= limit).then_some((distance, candidate))
        })
        .collect();

    scored.sort_by_key(|(distance, _)| *distance);
    scored.into_iter().take(MAX_CANDIDATES).map(|(_, candidate)| candidate.to_string()).collect()
}

fn edit_distance(left: &str, right: &str) -> usize {
    let right: Vec<char> = right.chars().collect();
    let mut previous: Vec<usize> = (0..=right.len()).collect();

    for (i, lc) in left.chars().enumerate() {
        let mut current = Vec::with_capacity(right.len() + 1);
        current.push(i + 1);
        for (j, rc) in right.iter().enumerate() {
            let substitution = previous[j] + usize::from(lc != *rc);
            current.push(substitution.min(previous[j + 1] + 1).min(current[j] + 1));
        }
        previous = current;
    }

    previous[right.len()]
}
