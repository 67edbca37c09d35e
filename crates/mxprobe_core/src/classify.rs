//! Status classification over the four captured SMTP responses.
//!
//! The rules run as a fixed, ordered cascade. Every matching rule records
//! its evidence (phrase matches, flags) even when a later rule overwrites
//! the status text: flags accumulate, status and detail are last-write-wins
//! within the rule order. Rules 6 and 7 only apply when no earlier rule
//! produced a status.

use crate::record::{PhraseMatch, SmtpResponse, Status, ValidationRecord};
use crate::reputation::ReferenceTables;
use regex::Regex;
use std::sync::LazyLock;

pub const DETAIL_DELIVERABLE: &str =
    "email provider confirmed that the email address is deliverable";
pub const DETAIL_DISABLED: &str = "email provider confirmed that the email address is disabled";
pub const DETAIL_MAILBOX_FULL: &str = "email address exists but mailbox is full";
pub const DETAIL_INVALID: &str = "email provider confirmed that email address does not exist";
pub const DETAIL_BLACKLISTED: &str = "email provider does not allow us to validate";
pub const DETAIL_LIKELY_INVALID: &str = "email provider rejects our connection requests, but we are not blacklisted, which likely means email deliveries will fail";
pub const DETAIL_UNIDENTIFIED: &str = "we were not able to identify the status";

/// Reply codes meaning the recipient was accepted.
pub fn is_deliverable_code(code: &str) -> bool {
    code == "250" || code == "251"
}

/// `<...>`-bracketed substrings, stripped before phrase matching so the
/// echoed target address cannot match a validation phrase.
static BRACKETED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("bracket pattern failed to compile"));

fn strip_bracketed(message: &str) -> String {
    BRACKETED.replace_all(message, "").into_owned()
}

/// Case-insensitive phrase scan over every response message. All matches
/// are appended to `matches` as evidence, not just the first.
fn match_phrases(
    responses: &[SmtpResponse],
    phrases: &[String],
    matches: &mut Vec<PhraseMatch>,
) -> bool {
    let mut matched = false;
    for response in responses {
        let haystack = strip_bracketed(&response.message).to_lowercase();
        for phrase in phrases {
            if haystack.contains(&phrase.to_lowercase()) {
                matched = true;
                matches.push(PhraseMatch {
                    phrase: phrase.clone(),
                    message: response.message.clone(),
                });
            }
        }
    }
    matched
}

/// Apply the rule cascade to a record holding a completed 4-response probe.
///
/// `catch_all_confirmed` is the outcome of the bogus-address sub-probe,
/// already run by the pipeline when the primary 4th response was 250/251;
/// `Some(true)` means the mail system accepted the fabricated recipient
/// too.
pub fn apply_rules(record: &mut ValidationRecord, tables: &ReferenceTables, catch_all_confirmed: Option<bool>) {
    let Some(fourth) = record.smtp_responses.get(3).cloned() else {
        // Partial probes are failures, never partial successes.
        record.status = Status::Unknown;
        record.status_detail = DETAIL_UNIDENTIFIED.to_string();
        return;
    };

    let responses = record.smtp_responses.clone();
    let mut verdict: Option<(Status, &str)> = None;

    // Rule 1: accepted recipient, tentatively deliverable.
    if is_deliverable_code(&fourth.code) {
        verdict = Some((Status::Valid, DETAIL_DELIVERABLE));
        if catch_all_confirmed == Some(true) {
            record.is_catch_all = true;
        }
    }

    // Rule 2: account disabled.
    if match_phrases(
        &responses,
        &tables.account_disabled_phrases,
        &mut record.phrase_matches,
    ) {
        verdict = Some((Status::Disabled, DETAIL_DISABLED));
    }

    // Rule 3: mailbox full. The address exists, so this is still valid.
    if match_phrases(
        &responses,
        &tables.mailbox_full_phrases,
        &mut record.phrase_matches,
    ) {
        verdict = Some((Status::Valid, DETAIL_MAILBOX_FULL));
        record.is_mailbox_full = true;
    }

    // Rule 4: the provider says the address does not exist.
    if match_phrases(
        &responses,
        &tables.invalid_address_phrases,
        &mut record.phrase_matches,
    ) {
        verdict = Some((Status::Invalid, DETAIL_INVALID));
    }

    // Rule 5: we are being refused, not the address.
    if match_phrases(
        &responses,
        &tables.blacklisted_phrases,
        &mut record.phrase_matches,
    ) {
        verdict = Some((Status::Unknown, DETAIL_BLACKLISTED));
    }

    // Rule 6: unexplained 4xx/5xx permanent or transient rejection.
    if verdict.is_none() && (fourth.code.starts_with('4') || fourth.code.starts_with('5')) {
        verdict = Some((Status::LikelyInvalid, DETAIL_LIKELY_INVALID));
    }

    // Rule 7: nothing matched.
    let (status, detail) = verdict.unwrap_or((Status::Unknown, DETAIL_UNIDENTIFIED));
    record.status = status;
    record.status_detail = detail.to_string();
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn response(code: &str, message: &str) -> SmtpResponse {
        SmtpResponse {
            code: code.to_string(),
            subcode: String::new(),
            message: message.to_string(),
        }
    }

    fn probe_record(responses: Vec<SmtpResponse>) -> ValidationRecord {
        let mut record = ValidationRecord::new("user@example.com", false);
        record.smtp_responses = responses;
        record
    }

    fn happy_path(last: SmtpResponse) -> Vec<SmtpResponse> {
        vec![
            response("220", "mx.example.com ESMTP"),
            response("250", "Hello"),
            response("250", "Sender OK"),
            last,
        ]
    }

    #[test]
    fn accepted_recipient_is_valid() {
        let mut record = probe_record(happy_path(response("250", "Recipient OK")));
        apply_rules(&mut record, &ReferenceTables::builtin(), None);
        assert_eq!(record.status, Status::Valid);
        assert_eq!(record.status_detail, DETAIL_DELIVERABLE);
        assert!(!record.is_catch_all);
    }

    #[test]
    fn catch_all_flag_requires_confirmed_sub_probe() {
        let tables = ReferenceTables::builtin();

        let mut record = probe_record(happy_path(response("251", "User not local")));
        apply_rules(&mut record, &tables, Some(true));
        assert!(record.is_catch_all);

        let mut record = probe_record(happy_path(response("250", "Recipient OK")));
        apply_rules(&mut record, &tables, Some(false));
        assert!(!record.is_catch_all);

        // A rejected recipient can never be catch-all.
        let mut record = probe_record(happy_path(response("550", "No such user")));
        apply_rules(&mut record, &tables, None);
        assert!(!record.is_catch_all);
    }

    #[test]
    fn disabled_phrase_wins_over_deliverable_code() {
        let mut record = probe_record(happy_path(response(
            "250",
            "Recipient OK but account has been disabled",
        )));
        apply_rules(&mut record, &ReferenceTables::builtin(), None);
        assert_eq!(record.status, Status::Disabled);
        assert_eq!(record.status_detail, DETAIL_DISABLED);
    }

    #[test]
    fn mailbox_full_is_valid_and_sets_the_flag() {
        let mut record = probe_record(happy_path(response(
            "452",
            "<user@example.com> mailbox full, try later",
        )));
        apply_rules(&mut record, &ReferenceTables::builtin(), None);
        assert_eq!(record.status, Status::Valid);
        assert_eq!(record.status_detail, DETAIL_MAILBOX_FULL);
        assert!(record.is_mailbox_full);
        // The bracketed target address was stripped before matching.
        assert!(record
            .phrase_matches
            .iter()
            .any(|m| m.phrase == "mailbox full"));
    }

    #[test]
    fn bracketed_address_cannot_self_match() {
        // The account name contains a phrase; brackets keep it out of scope.
        let mut record = probe_record(happy_path(response(
            "550",
            "<no.such.user@example.com> rejected by policy",
        )));
        apply_rules(&mut record, &ReferenceTables::builtin(), None);
        // "no such user" inside the brackets must not match; the bare 550
        // with no phrase falls through to rule 6.
        assert_eq!(record.status, Status::LikelyInvalid);
    }

    #[test]
    fn invalid_user_phrase_is_terminal_invalid() {
        let mut record = probe_record(happy_path(response(
            "550",
            "5.1.1 The email account that you tried to reach does not exist",
        )));
        apply_rules(&mut record, &ReferenceTables::builtin(), None);
        assert_eq!(record.status, Status::Invalid);
        assert_eq!(record.status_detail, DETAIL_INVALID);
    }

    #[test]
    fn blacklist_phrase_means_unknown() {
        let mut record = probe_record(happy_path(response(
            "554",
            "Service unavailable; client host blocked using Spamhaus",
        )));
        apply_rules(&mut record, &ReferenceTables::builtin(), None);
        assert_eq!(record.status, Status::Unknown);
        assert_eq!(record.status_detail, DETAIL_BLACKLISTED);
    }

    #[test]
    fn unexplained_rejection_is_likely_invalid() {
        let mut record = probe_record(happy_path(response("554", "Transaction failed")));
        apply_rules(&mut record, &ReferenceTables::builtin(), None);
        assert_eq!(record.status, Status::LikelyInvalid);
        assert_eq!(record.status_detail, DETAIL_LIKELY_INVALID);
    }

    #[test]
    fn unmatched_2xx_dialogue_is_unknown() {
        let mut record = probe_record(happy_path(response("221", "Bye")));
        apply_rules(&mut record, &ReferenceTables::builtin(), None);
        assert_eq!(record.status, Status::Unknown);
        assert_eq!(record.status_detail, DETAIL_UNIDENTIFIED);
    }

    #[test]
    fn evidence_accumulates_across_overridden_rules() {
        // Disabled and invalid both match; invalid wins the status but both
        // phrase matches are kept as evidence.
        let mut record = probe_record(happy_path(response(
            "550",
            "account disabled; user unknown",
        )));
        apply_rules(&mut record, &ReferenceTables::builtin(), None);
        assert_eq!(record.status, Status::Invalid);
        assert!(record.phrase_matches.iter().any(|m| m.phrase == "disabled"));
        assert!(record
            .phrase_matches
            .iter()
            .any(|m| m.phrase == "user unknown"));
    }

    #[test]
    fn phrase_matching_is_case_insensitive() {
        let mut record = probe_record(happy_path(response("550", "NO SUCH USER HERE")));
        apply_rules(&mut record, &ReferenceTables::builtin(), None);
        assert_eq!(record.status, Status::Invalid);
    }
}
