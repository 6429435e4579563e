//! Access control integration tests
//!
//! This test suite covers:
//! - Owner-scoped methods
//! - Filter rejections in simple, nested (`a[b]`) and collection (`a[]`) form
//! - Owner exceptions on rejections
//! - Catalog merging of rejected filters
//! - Decision properties (idempotence, rule order, concurrency)
//!
//! IMPORTANT: The engine has the following behavior:
//! - A request is allowed if ANY resource fully passes
//! - Requests matching no resource are denied
//! - Shape mismatches in the query (nested lookup on a scalar, membership on
//!   a scalar) are "no match", never errors

use access_controller::access_control::{
    AccessController, Decision, DecisionEngine, IncomingRequest, Query, QueryValue, RuleSetBuilder,
    parse_query_string,
};
use access_controller::config::{
    AccessControlConfig, FilterRejectionConfig, MethodConfig, RejectedFilterConfig, ResourceConfig,
};
use rstest::rstest;
use std::sync::Arc;

// =============================================================================
// Test Helpers
// =============================================================================

fn resource(
    template: &str,
    methods: Vec<MethodConfig>,
    rejections: Vec<FilterRejectionConfig>,
) -> ResourceConfig {
    ResourceConfig {
        resource: template.to_string(),
        methods,
        filters_rejection: rejections,
    }
}

fn engine_with(resources: Vec<ResourceConfig>) -> DecisionEngine {
    DecisionEngine::new(RuleSetBuilder::new(resources).build().unwrap())
}

fn engine_from(config: AccessControlConfig) -> DecisionEngine {
    DecisionEngine::from_config(&config).unwrap()
}

fn get(path: &str, query: &str) -> IncomingRequest {
    IncomingRequest::new(path, "GET").with_query(parse_query_string(query))
}

// =============================================================================
// 1. Owner-scoped methods
// =============================================================================

mod owner_scoped_methods {
    use super::*;

    fn profile_engine() -> DecisionEngine {
        engine_with(vec![resource(
            r"/users/{owner:\w+}/profile",
            vec![MethodConfig::owner_only("GET")],
            vec![],
        )])
    }

    #[test]
    fn test_owner_allowed() {
        let request = get("/users/alice/profile", "").with_principal("alice");
        assert_eq!(profile_engine().evaluate(&request), Decision::Allow);
    }

    #[test]
    fn test_other_principal_denied() {
        let request = get("/users/alice/profile", "").with_principal("bob");
        assert_eq!(profile_engine().evaluate(&request), Decision::Deny);
    }

    #[test]
    fn test_anonymous_denied() {
        let request = get("/users/alice/profile", "");
        assert!(profile_engine().evaluate(&request).is_denied());
    }

    #[test]
    fn test_method_not_listed_denied() {
        let request = IncomingRequest::new("/users/alice/profile", "DELETE").with_principal("alice");
        assert!(profile_engine().evaluate(&request).is_denied());
    }

    #[test]
    fn test_public_read_owner_write() {
        let engine = engine_with(vec![resource(
            r"/posts/{owner:[a-z]+}",
            vec![MethodConfig::new("GET"), MethodConfig::owner_only("PUT")],
            vec![],
        )]);

        let read = IncomingRequest::new("/posts/alice", "GET").with_principal("bob");
        let write_other = IncomingRequest::new("/posts/alice", "PUT").with_principal("bob");
        let write_owner = IncomingRequest::new("/posts/alice", "PUT").with_principal("alice");

        assert!(engine.evaluate(&read).is_allowed());
        assert!(engine.evaluate(&write_other).is_denied());
        assert!(engine.evaluate(&write_owner).is_allowed());
    }

    #[test]
    fn test_owner_required_without_owner_capture_never_passes() {
        let engine = engine_with(vec![resource(
            "/settings",
            vec![MethodConfig::owner_only("GET")],
            vec![],
        )]);
        let request = get("/settings", "").with_principal("alice");
        assert!(engine.evaluate(&request).is_denied());
    }
}

// =============================================================================
// 2. Filter rejections
// =============================================================================

mod filter_rejections {
    use super::*;

    fn users_engine(rejection: FilterRejectionConfig) -> DecisionEngine {
        engine_with(vec![resource(
            r"/users/{owner:\w+}",
            vec![MethodConfig::new("GET")],
            vec![rejection],
        )])
    }

    #[rstest]
    #[case::nested_value_matches("mmTokens[exists]=1", Decision::Deny)]
    #[case::nested_other_value("mmTokens[exists]=0", Decision::Allow)]
    #[case::nested_other_field("mmTokens[count]=1", Decision::Allow)]
    #[case::nested_against_scalar("mmTokens=1", Decision::Allow)]
    #[case::absent("", Decision::Allow)]
    fn test_nested_rejection(#[case] query: &str, #[case] expected: Decision) {
        let engine = users_engine(FilterRejectionConfig::new("mmTokens[exists]", Some("1")));
        let request = get("/users/alice", query).with_principal("bob");
        assert_eq!(engine.evaluate(&request), expected);
    }

    #[rstest]
    #[case::member("groups[]=mm&groups[]=other", Decision::Deny)]
    #[case::only_member("groups[]=mm", Decision::Deny)]
    #[case::not_member("groups[]=other", Decision::Allow)]
    #[case::scalar_is_not_collection("groups=mm", Decision::Allow)]
    fn test_collection_rejection(#[case] query: &str, #[case] expected: Decision) {
        let engine = users_engine(FilterRejectionConfig::new("groups[]", Some("mm")));
        assert_eq!(engine.evaluate(&get("/users/alice", query)), expected);
    }

    #[rstest]
    #[case::with_value("debug=1", Decision::Deny)]
    #[case::empty_value("debug=", Decision::Deny)]
    #[case::bare_key("debug", Decision::Deny)]
    #[case::as_list("debug[]=x", Decision::Deny)]
    #[case::other_key("verbose=1", Decision::Allow)]
    fn test_presence_only_rejection(#[case] query: &str, #[case] expected: Decision) {
        let engine = users_engine(FilterRejectionConfig::new("debug", None));
        assert_eq!(engine.evaluate(&get("/users/alice", query)), expected);
    }

    #[rstest]
    #[case::equal("state=closed", Decision::Deny)]
    #[case::different("state=open", Decision::Allow)]
    #[case::repeated("state=closed&state=open", Decision::Allow)]
    fn test_simple_value_rejection(#[case] query: &str, #[case] expected: Decision) {
        let engine = users_engine(FilterRejectionConfig::new("state", Some("closed")));
        assert_eq!(engine.evaluate(&get("/users/alice", query)), expected);
    }

    #[test]
    fn test_structured_query_from_host() {
        let engine = users_engine(FilterRejectionConfig::new("mmTokens[exists]", Some("1")));

        let mut query = Query::new();
        query.insert(
            "mmTokens".to_string(),
            QueryValue::map([("exists", QueryValue::scalar("1"))]),
        );
        let request = IncomingRequest::new("/users/alice", "GET").with_query(query);

        assert!(engine.evaluate(&request).is_denied());
    }

    #[test]
    fn test_any_rejection_fires() {
        let engine = engine_with(vec![resource(
            "/search",
            vec![MethodConfig::new("GET")],
            vec![
                FilterRejectionConfig::new("debug", None),
                FilterRejectionConfig::new("scope", Some("all")),
            ],
        )]);

        assert!(engine.evaluate(&get("/search", "q=rust")).is_allowed());
        assert!(engine.evaluate(&get("/search", "q=rust&scope=all")).is_denied());
        assert!(engine.evaluate(&get("/search", "debug")).is_denied());
    }
}

// =============================================================================
// 3. Owner exceptions
// =============================================================================

mod owner_exceptions {
    use super::*;

    fn tokens_engine() -> DecisionEngine {
        engine_with(vec![resource(
            r"/users/{owner:\w+}",
            vec![MethodConfig::new("GET")],
            vec![FilterRejectionConfig::new("mmTokens[exists]", Some("1")).except_owner()],
        )])
    }

    #[test]
    fn test_owner_excused() {
        let request = get("/users/alice", "mmTokens[exists]=1").with_principal("alice");
        assert!(tokens_engine().evaluate(&request).is_allowed());
    }

    #[test]
    fn test_non_owner_rejected() {
        let request = get("/users/alice", "mmTokens[exists]=1").with_principal("bob");
        assert!(tokens_engine().evaluate(&request).is_denied());
    }

    #[test]
    fn test_anonymous_rejected() {
        let request = get("/users/alice", "mmTokens[exists]=1");
        assert!(tokens_engine().evaluate(&request).is_denied());
    }

    #[test]
    fn test_no_owner_capture_means_no_exception() {
        let engine = engine_with(vec![resource(
            "/users",
            vec![MethodConfig::new("GET")],
            vec![FilterRejectionConfig::new("debug", None).except_owner()],
        )]);
        let request = get("/users", "debug").with_principal("alice");
        assert!(engine.evaluate(&request).is_denied());
    }

    #[test]
    fn test_exception_requires_method_to_pass() {
        let engine = engine_with(vec![resource(
            r"/users/{owner:\w+}",
            vec![MethodConfig::new("GET")],
            vec![FilterRejectionConfig::new("debug", None).except_owner()],
        )]);
        let request = IncomingRequest::new("/users/alice", "POST")
            .with_query(parse_query_string("debug"))
            .with_principal("alice");
        assert!(engine.evaluate(&request).is_denied());
    }
}

// =============================================================================
// 4. Filter catalog
// =============================================================================

mod filter_catalog {
    use super::*;

    fn catalog_config(local: FilterRejectionConfig) -> AccessControlConfig {
        AccessControlConfig {
            allowed_resources: vec![resource(
                r"/users/{owner:\w+}",
                vec![MethodConfig::new("GET")],
                vec![local],
            )],
            rejected_filters: vec![RejectedFilterConfig {
                filter: "tokens".to_string(),
                key: Some("mmTokens[exists]".to_string()),
                value: Some("1".to_string()),
                except_owner: None,
            }],
        }
    }

    #[test]
    fn test_reference_resolved_from_catalog() {
        let engine = engine_from(catalog_config(FilterRejectionConfig::reference("tokens")));
        let request = get("/users/alice", "mmTokens[exists]=1").with_principal("bob");
        assert!(engine.evaluate(&request).is_denied());
    }

    #[test]
    fn test_local_except_owner_kept() {
        let engine = engine_from(catalog_config(
            FilterRejectionConfig::reference("tokens").except_owner(),
        ));

        let owner = get("/users/alice", "mmTokens[exists]=1").with_principal("alice");
        let other = get("/users/alice", "mmTokens[exists]=1").with_principal("bob");
        assert!(engine.evaluate(&owner).is_allowed());
        assert!(engine.evaluate(&other).is_denied());
    }

    #[test]
    fn test_catalog_overrides_local_key() {
        let local = FilterRejectionConfig {
            filter: Some("tokens".to_string()),
            key: Some("ignored".to_string()),
            value: None,
            except_owner: None,
        };
        let engine = engine_from(catalog_config(local));

        assert!(engine.evaluate(&get("/users/alice", "ignored=1")).is_allowed());
        assert!(
            engine
                .evaluate(&get("/users/alice", "mmTokens[exists]=1"))
                .is_denied()
        );
    }

    #[test]
    fn test_unreferenced_local_entry_untouched() {
        let engine = engine_from(catalog_config(FilterRejectionConfig::new("debug", None)));
        assert!(engine.evaluate(&get("/users/alice", "mmTokens[exists]=1")).is_allowed());
        assert!(engine.evaluate(&get("/users/alice", "debug")).is_denied());
    }

    #[test]
    fn test_dangling_reference_rejected_at_load() {
        let config = AccessControlConfig {
            allowed_resources: vec![resource(
                "/users",
                vec![MethodConfig::new("GET")],
                vec![FilterRejectionConfig::reference("nope")],
            )],
            rejected_filters: vec![],
        };
        assert!(DecisionEngine::from_config(&config).is_err());
    }
}

// =============================================================================
// 5. Path matching
// =============================================================================

mod path_matching {
    use super::*;

    #[rstest]
    #[case("/users/alice/profile", true)]
    #[case("/users/alice/profile/", false)]
    #[case("/api/users/alice/profile", false)]
    #[case("/users/alice/bob/profile", false)]
    fn test_templates_are_anchored(#[case] path: &str, #[case] allowed: bool) {
        let engine = engine_with(vec![resource(
            r"/users/{\w+}/profile",
            vec![MethodConfig::new("GET")],
            vec![],
        )]);
        assert_eq!(engine.evaluate(&get(path, "")).is_allowed(), allowed);
    }

    #[test]
    fn test_alternation_template_does_not_allow_prefixes() {
        let engine = engine_with(vec![resource(
            "/public|/status",
            vec![MethodConfig::new("GET")],
            vec![],
        )]);

        assert!(engine.evaluate(&get("/public", "")).is_allowed());
        assert!(engine.evaluate(&get("/status", "")).is_allowed());
        assert!(engine.evaluate(&get("/public/admin/secret", "")).is_denied());
        assert!(engine.evaluate(&get("/private/status", "")).is_denied());
    }

    #[test]
    fn test_no_rule_matches_path() {
        let engine = engine_with(vec![resource("/status", vec![MethodConfig::new("GET")], vec![])]);
        assert!(engine.evaluate(&get("/admin", "")).is_denied());
    }

    #[test]
    fn test_invalid_templates_fail_build() {
        for template in [r"/a/{owner:\w+}/{owner:\w+}", r"/a/{owner:\w+", "/a/}"] {
            let result = RuleSetBuilder::new([resource(
                template,
                vec![MethodConfig::new("GET")],
                vec![],
            )])
            .build();
            assert!(result.is_err(), "template {} should be rejected", template);
        }
    }
}

// =============================================================================
// 6. Decision properties
// =============================================================================

mod decision_properties {
    use super::*;

    fn catalog() -> Vec<ResourceConfig> {
        vec![
            resource(
                r"/users/{owner:\w+}/profile",
                vec![MethodConfig::owner_only("GET")],
                vec![],
            ),
            resource(
                "/groups",
                vec![MethodConfig::new("GET")],
                vec![FilterRejectionConfig::new("groups[]", Some("mm"))],
            ),
            resource("/status", vec![MethodConfig::new("GET")], vec![]),
        ]
    }

    fn requests() -> Vec<IncomingRequest> {
        vec![
            get("/users/alice/profile", "").with_principal("alice"),
            get("/users/alice/profile", "").with_principal("bob"),
            get("/groups", "groups[]=mm"),
            get("/groups", "groups[]=other"),
            get("/status", ""),
            get("/missing", ""),
        ]
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let engine = engine_with(catalog());
        for request in requests() {
            assert_eq!(engine.evaluate(&request), engine.evaluate(&request));
        }
    }

    #[test]
    fn test_rule_order_does_not_change_decision() {
        let forward = engine_with(catalog());
        let mut reversed_rules = catalog();
        reversed_rules.reverse();
        let reversed = engine_with(reversed_rules);

        for request in requests() {
            assert_eq!(forward.evaluate(&request), reversed.evaluate(&request));
        }
    }

    #[test]
    fn test_concurrent_evaluation() {
        let engine = Arc::new(engine_with(catalog()));
        let expected: Vec<Decision> = requests().iter().map(|r| engine.evaluate(r)).collect();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let engine = engine.clone();
                std::thread::spawn(move || {
                    requests()
                        .iter()
                        .map(|r| engine.evaluate(r))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    }

    #[test]
    fn test_controller_matches_engine() {
        let engine = Arc::new(engine_with(catalog()));
        let controller =
            AccessController::new(engine.clone(), |r: &IncomingRequest| r.principal.clone());

        for request in requests() {
            assert_eq!(controller.check(&request), engine.evaluate(&request));
        }
    }
}
