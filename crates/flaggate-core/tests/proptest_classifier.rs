use flaggate_core::{Classifier, Reason, RolloutStrategy, RuleSet, TicketRecord, suggest_rollout_strategy};
use proptest::prelude::*;
use proptest::sample::select;

fn arb_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 /:_-]{0,48}"
}

fn arb_ticket() -> impl Strategy<Value = TicketRecord> {
    (arb_text(), arb_text(), "[A-Z]{2,4}-[0-9]{1,4}").prop_map(|(title, description, identifier)| {
        TicketRecord {
            title,
            description,
            identifier,
            ..TicketRecord::default()
        }
    })
}

/// Random capitalization of a keyword, e.g. "Kill SWITCH".
fn arb_cased(keyword: String) -> impl Strategy<Value = String> {
    proptest::collection::vec(any::<bool>(), keyword.chars().count()).prop_map(move |flips| {
        keyword
            .chars()
            .zip(flips)
            .map(|(c, upper)| if upper { c.to_ascii_uppercase() } else { c })
            .collect()
    })
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(512))]

    #[test]
    fn classification_is_idempotent(ticket in arb_ticket()) {
        let classifier = Classifier::default();
        prop_assert_eq!(classifier.classify(&ticket), classifier.classify(&ticket));
    }

    #[test]
    fn reasons_are_never_empty_and_agree_with_decision(ticket in arb_ticket()) {
        let result = Classifier::default().classify(&ticket);
        prop_assert!(!result.reasons().is_empty());
        let has_real_reason = result.reasons().iter().any(|reason| !reason.is_sentinel());
        prop_assert_eq!(result.requires_flag(), has_real_reason);
    }

    #[test]
    fn any_keyword_in_title_or_description_requires_flag(
        keyword in select(RuleSet::default().keywords).prop_flat_map(arb_cased),
        prefix in arb_text(),
        in_title in any::<bool>(),
    ) {
        let text = format!("{prefix} {keyword} tail");
        let ticket = if in_title {
            TicketRecord { title: text, ..TicketRecord::default() }
        } else {
            TicketRecord { description: text, ..TicketRecord::default() }
        };

        let result = Classifier::default().classify(&ticket);

        prop_assert!(result.requires_flag());
        prop_assert!(result.reasons().contains(&Reason::Keyword(keyword.to_lowercase())));
    }

    #[test]
    fn canonical_label_always_requires_flag(ticket in arb_ticket(), named in any::<bool>()) {
        let mut ticket = ticket;
        ticket.labels.push(if named {
            flaggate_core::Label::Named("feature-flag-needed".to_string())
        } else {
            flaggate_core::Label::Plain("FEATURE-FLAG-NEEDED".to_string())
        });

        let result = Classifier::default().classify(&ticket);

        prop_assert!(result.requires_flag());
        prop_assert!(result
            .reasons()
            .contains(&Reason::CanonicalLabel("feature-flag-needed".to_string())));
    }

    #[test]
    fn rollout_without_flag_is_standard(ticket in arb_ticket()) {
        prop_assert_eq!(
            suggest_rollout_strategy(&ticket, false),
            RolloutStrategy::StandardDeployment
        );
    }
}
