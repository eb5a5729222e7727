//! Property tests across the protocol, server and engine.

use proptest::prelude::*;
use tandem_engine::FlushOutcome;
use tandem_protocol::{create_delta, transform, Delta, SubmitRequest, SubmitResponse};
use tandem_testkit::prelude::*;

proptest! {
    #![proptest_config(PropTestConfig::default().to_proptest_config())]

    #[test]
    fn diff_then_apply_roundtrips((old, new) in edit_strategy()) {
        let delta = create_delta(&old, &new);
        prop_assert_eq!(delta.apply(&old), new);
    }

    #[test]
    fn diff_of_equal_texts_is_empty(text in text_strategy()) {
        let delta = create_delta(&text, &text);
        prop_assert!(delta.is_empty());
        prop_assert_eq!(Delta::new().apply(&text), text);
    }

    #[test]
    fn transform_closes_the_diamond((base, left, right) in concurrent_edits_strategy()) {
        let a = create_delta(&base, &left);
        let b = create_delta(&base, &right);

        let (a_prime, b_prime) = transform(&a, &b);
        prop_assert_eq!(b_prime.apply(&left), a_prime.apply(&right));

        let (b_prime, a_prime) = transform(&b, &a);
        prop_assert_eq!(a_prime.apply(&right), b_prime.apply(&left));
    }

    #[test]
    fn compose_is_sequential_application(
        (base, middle) in edit_strategy(),
        splice in splice_strategy(),
    ) {
        let end = splice.apply_to(&middle);
        let first = create_delta(&base, &middle);
        let second = create_delta(&middle, &end);
        prop_assert_eq!(first.compose(&second).apply(&base), end);
    }

    #[test]
    fn composed_pending_edits_match_their_sequence(
        base in text_strategy(),
        splices in prop::collection::vec(splice_strategy(), 1..6),
    ) {
        let mut texts = vec![base.clone()];
        for splice in &splices {
            let next = splice.apply_to(texts.last().unwrap());
            texts.push(next);
        }
        let composed = texts
            .windows(2)
            .map(|pair| create_delta(&pair[0], &pair[1]))
            .fold(Delta::new(), |acc, delta| acc.compose(&delta));
        prop_assert_eq!(composed.apply(&base), texts.last().unwrap().clone());
    }
}

proptest! {
    #![proptest_config(PropTestConfig::quick().to_proptest_config())]

    #[test]
    fn versions_are_monotonic_and_conflicts_change_nothing(
        base in text_strategy(),
        steps in prop::collection::vec((0u64..3, splice_strategy()), 1..20),
    ) {
        let fixture = TestServer::new();
        let id = fixture.create_document("alice", &base, &[]);
        let mut version = 0u64;

        for (lag, splice) in steps {
            let content = fixture.content(&id);
            let expected = version.saturating_sub(lag);
            let delta = create_delta(&content, &splice.apply_to(&content));

            let response = fixture
                .server
                .submit(SubmitRequest::new(&id, delta.clone(), expected, "alice"))
                .unwrap();

            match response {
                SubmitResponse::Accepted(entry) => {
                    prop_assert_eq!(expected, version);
                    prop_assert_eq!(entry.version, version + 1);
                    version += 1;
                }
                SubmitResponse::Unchanged { version: current } => {
                    prop_assert!(delta.is_identity());
                    prop_assert_eq!(expected, version);
                    prop_assert_eq!(current, version);
                }
                SubmitResponse::Conflict(conflict) => {
                    prop_assert!(expected < version);
                    prop_assert_eq!(conflict.current_version, version);
                    prop_assert_eq!(&conflict.current_content, &content);
                    prop_assert_eq!(fixture.content(&id), content);
                }
            }
        }

        let state = fixture.store.get(&id).unwrap();
        prop_assert!(state.verify().is_ok());
        prop_assert_eq!(state.current_version(), version);
    }

    #[test]
    fn clients_converge(
        base in text_strategy(),
        script in client_script_strategy(3, 1, 30),
    ) {
        let fixture = TestServer::new();
        let id = fixture.create_document("alice", &base, &["bob", "carol"]);
        let mut clients = vec![
            fixture.client(&id, "alice"),
            fixture.client(&id, "bob"),
            fixture.client(&id, "carol"),
        ];

        for (index, action) in script {
            let client = &mut clients[index];
            match action {
                ClientAction::Edit(splice) => {
                    let next = splice.apply_to(client.content());
                    client.edit(&next).unwrap();
                }
                ClientAction::Flush => {
                    prop_assert_ne!(client.flush().unwrap(), FlushOutcome::NeedsResolution);
                }
                ClientAction::Drain => {
                    client.drain_events().unwrap();
                }
            }
        }

        settle(&mut clients, 16);

        let server_content = fixture.content(&id);
        let server_version = fixture.store.get(&id).unwrap().current_version();
        for client in &clients {
            prop_assert_eq!(client.content(), server_content.as_str());
            prop_assert_eq!(client.base_version(), server_version);
            prop_assert!(!client.session().has_pending());
        }
    }
}
