use std::collections::{HashMap, HashSet};

use crate::errors::Result;
use crate::pricing::pricing_model::{
    Diagnostic, DiagnosticCode, PriceQuoteRequest, PricingRule, ProfileRuleRow, RuleGroup,
    RuleSource,
};
use crate::pricing::pricing_traits::RuleStoreTrait;

/// Candidate rule groups for one quote, in resolution order, plus the
/// diagnostics produced while validating their rows.
pub struct ResolvedGroups {
    pub groups: Vec<RuleGroup>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Computes the full set of rule groups applicable to one quote: the ADHOC
/// pseudo-profile (client exceptions), then client-assigned profiles, then
/// global profiles, then caller-asserted extras, de-duplicated by id.
///
/// The order fixed here is the "group resolution order" the composition
/// engine uses to break ties between otherwise equal rules.
pub fn resolve_groups(
    store: &dyn RuleStoreTrait,
    request: &PriceQuoteRequest,
) -> Result<ResolvedGroups> {
    let mut groups = Vec::new();
    let mut diagnostics = Vec::new();

    // Client exceptions come first; they bypass profiles entirely.
    if let Some(client_id) = request.client_id.as_deref() {
        let rows = store.get_client_exception_rules(client_id, &request.article)?;
        let rules = parse_rows(&rows, &RuleSource::Adhoc, &mut diagnostics);
        if !rules.is_empty() {
            groups.push(RuleGroup {
                source: RuleSource::Adhoc,
                rules,
            });
        }
    }

    // Union of client-assigned, global and extra profile ids, first
    // occurrence wins.
    let mut ids: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    fn push_ids(batch: Vec<String>, ids: &mut Vec<String>, seen: &mut HashSet<String>) {
        for id in batch {
            if seen.insert(id.clone()) {
                ids.push(id);
            }
        }
    }

    if let Some(client_id) = request.client_id.as_deref() {
        push_ids(
            store.get_client_assigned_profiles(client_id)?,
            &mut ids,
            &mut seen,
        );
    }
    push_ids(store.get_global_profiles()?, &mut ids, &mut seen);
    push_ids(request.extra_profile_ids.clone(), &mut ids, &mut seen);

    if ids.is_empty() {
        return Ok(ResolvedGroups { groups, diagnostics });
    }

    let profiles: HashMap<String, _> = store
        .get_profiles(&ids)?
        .into_iter()
        .map(|p| (p.id.clone(), p))
        .collect();

    let rows = store.get_profile_rules(&ids, &request.article)?;
    let mut rows_by_profile: HashMap<&str, Vec<&ProfileRuleRow>> = HashMap::new();
    for row in &rows {
        if let Some(profile_id) = row.profile_id.as_deref() {
            rows_by_profile.entry(profile_id).or_default().push(row);
        }
    }

    for id in &ids {
        let profile = match profiles.get(id) {
            Some(profile) => profile,
            None => {
                // Caller-asserted flags may reference profiles that no
                // longer exist; they just contribute nothing.
                log::debug!("Profile id '{}' not found in rule store, skipping", id);
                continue;
            }
        };

        let source = RuleSource::Profile {
            id: profile.id.clone(),
            name: profile.name.clone(),
        };
        let rules = match rows_by_profile.get(id.as_str()) {
            Some(rows) => rows
                .iter()
                .filter_map(|row| parse_row(row, &source, &mut diagnostics))
                .collect(),
            None => Vec::new(),
        };

        if !rules.is_empty() {
            groups.push(RuleGroup { source, rules });
        }
    }

    Ok(ResolvedGroups { groups, diagnostics })
}

fn parse_rows(
    rows: &[ProfileRuleRow],
    source: &RuleSource,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<PricingRule> {
    rows.iter()
        .filter_map(|row| parse_row(row, source, diagnostics))
        .collect()
}

fn parse_row(
    row: &ProfileRuleRow,
    source: &RuleSource,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<PricingRule> {
    match PricingRule::from_row(row, source.clone()) {
        Ok(rule) => Some(rule),
        Err(reason) => {
            log::warn!(
                "Dropping malformed rule from '{}': {}",
                source.name(),
                reason
            );
            diagnostics.push(Diagnostic::new(
                DiagnosticCode::MalformedRule,
                format!("Rule from '{}' dropped: {}", source.name(), reason),
            ));
            None
        }
    }
}
