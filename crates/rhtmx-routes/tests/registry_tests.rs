use pretty_assertions::assert_eq;
use rhtmx_routes::{route, Config, MiddlewareSet, Params, RouteError, Routes, RoutingConfig};
use rhtmx_routes::middleware::{middleware_fn, Payload};
use rstest::rstest;

fn params(pairs: &[(&str, &str)]) -> Params {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn blog() -> Routes {
    let mut routes = Routes::new(RoutingConfig::with_locale("en"));
    routes
        .add(route("home").locale("en").pattern("/en").page("Home"))
        .unwrap();
    routes
        .add(route("home").locale("fr").pattern("/fr").page("Home"))
        .unwrap();
    routes
        .add(route("post").locale("en").pattern("/en/posts/:slug").page("Post"))
        .unwrap();
    routes
        .add(route("post").locale("fr").pattern("/fr/articles/:slug").page("Post"))
        .unwrap();
    routes
        .add(route("docs").locale("en").pattern("/en/docs/*path").page("Docs"))
        .unwrap();
    routes
        .add(route("archive").locale("en").pattern("/en/archive/:year?").page("Archive"))
        .unwrap();
    routes
}

#[rstest]
#[case("/en", Some("home"), Some("en"))]
#[case("/fr/", Some("home"), Some("fr"))]
#[case("/en/posts/hello", Some("post"), Some("en"))]
#[case("/fr/articles/bonjour?x=1", Some("post"), Some("fr"))]
#[case("/en/docs/guide/install", Some("docs"), Some("en"))]
#[case("/en/archive", Some("archive"), Some("en"))]
#[case("/en/archive/2024", Some("archive"), Some("en"))]
#[case("/de/posts/hallo", None, None)]
#[case("/en/posts", None, None)]
fn test_match_url(
    #[case] url: &str,
    #[case] name: Option<&str>,
    #[case] locale: Option<&str>,
) {
    let found = blog().match_url(url);
    assert_eq!(found.route.as_ref().map(|r| r.name.as_str()), name);
    assert_eq!(found.route.as_ref().and_then(|r| r.locale.as_deref()), locale);
}

#[test]
fn test_path_params_override_query() {
    let found = blog().match_url("/en/posts/real?slug=fake&page=2");
    assert_eq!(found.params, params(&[("slug", "real")]));
    assert_eq!(found.query, params(&[("page", "2"), ("slug", "real")]));
    assert_eq!(found.parsed_url.pathname, "/en/posts/real");
}

#[test]
fn test_first_registered_route_wins() {
    let mut routes = Routes::new(RoutingConfig::with_locale("en"));
    routes.add(route("new-post").pattern("/posts/new")).unwrap();
    routes.add(route("post").pattern("/posts/:id")).unwrap();

    assert_eq!(routes.match_url("/posts/new").route.unwrap().name, "new-post");
    assert_eq!(routes.match_url("/posts/7").route.unwrap().name, "post");
}

#[test]
fn test_duplicate_name_and_locale_rejected() {
    let mut routes = blog();
    let err = routes
        .add(route("post").locale("en").pattern("/en/p/:slug"))
        .unwrap_err();

    assert!(matches!(
        err,
        RouteError::RouteAlreadyExists { ref name, ref locale }
            if name == "post" && locale.as_deref() == Some("en")
    ));
    assert_eq!(routes.len(), 6);
}

#[test]
fn test_update_replaces_and_moves_to_end() {
    let mut routes = blog();
    routes
        .add(route("post").locale("en").pattern("/en/p/:slug").page("Post").update())
        .unwrap();

    assert_eq!(routes.len(), 6);
    assert_eq!(routes.iter().last().unwrap().pattern.source(), "/en/p/:slug");
    assert!(routes.match_url("/en/posts/x").route.is_none());
    assert_eq!(routes.match_url("/en/p/x").route.unwrap().name, "post");
}

#[test]
fn test_update_drops_old_middleware() {
    let mut routes = Routes::new(RoutingConfig::with_locale("en"));
    routes
        .add(route("a").pattern("/a"))
        .unwrap()
        .with_middleware(vec![middleware_fn(|_ctx| async { Ok(Payload::new()) })]);
    routes.add(route("a").pattern("/a").update()).unwrap();

    assert!(routes.find_by_name("a", None).unwrap().middlewares().is_empty());
}

#[test]
fn test_urls_for_default_and_explicit_locale() {
    let routes = blog();
    let p = params(&[("slug", "hello world"), ("ref", "feed")]);

    let en = routes.find_and_get_urls("post", None, &p).unwrap();
    assert_eq!(en.urls.as_path, "/en/posts/hello%20world?ref=feed");
    assert_eq!(en.urls.href, "/Post?ref=feed&slug=hello%20world");
    assert!(en.by_name);

    let fr = routes.find_and_get_urls("post", Some("fr"), &p).unwrap();
    assert_eq!(fr.urls.as_path, "/fr/articles/hello%20world?ref=feed");
    assert_eq!(fr.route.locale.as_deref(), Some("fr"));
}

#[test]
fn test_build_then_match_returns_same_params() {
    let routes = blog();
    let p = params(&[("path", "guide/install")]);
    let url = routes.find_and_get_urls("docs", None, &p).unwrap().urls.as_path;

    let found = routes.match_url(&url);
    assert_eq!(found.route.unwrap().name, "docs");
    assert_eq!(found.params, p);
}

#[test]
fn test_missing_route_and_missing_param() {
    let routes = blog();

    let err = routes.find_and_get_urls("post", Some("de"), &Params::new()).unwrap_err();
    assert!(matches!(err, RouteError::RouteNotFound { .. }));

    let err = routes.find_and_get_urls("post", None, &Params::new()).unwrap_err();
    assert!(matches!(err, RouteError::MissingParam { ref name, .. } if name == "post"));

    // optional parameter may be omitted
    let archive = routes.find_and_get_urls("archive", None, &Params::new()).unwrap();
    assert_eq!(archive.urls.as_path, "/en/archive");
}

#[test]
fn test_multilanguage_urls_follow_registration_order() {
    let routes = blog();
    let found = routes.match_url("/fr/articles/bonjour");
    let urls = routes.multilanguage_urls(found.route.as_ref().unwrap(), &found.query);

    let listed: Vec<(&str, Option<&str>, bool)> = urls
        .iter()
        .map(|u| (u.url.as_str(), u.locale.as_deref(), u.is_default_locale))
        .collect();
    assert_eq!(
        listed,
        vec![
            ("/en/posts/bonjour", Some("en"), true),
            ("/fr/articles/bonjour", Some("fr"), false),
        ]
    );
}

#[rstest]
#[case("posts/:id")]
#[case("/posts/:id/:id")]
#[case("/docs/*path/edit")]
#[case("/posts/:")]
fn test_invalid_patterns_rejected(#[case] pattern: &str) {
    let mut routes = Routes::new(RoutingConfig::with_locale("en"));
    let err = routes.add(route("bad").pattern(pattern)).unwrap_err();
    assert!(matches!(err, RouteError::InvalidPattern { .. }));
    assert!(routes.is_empty());
}

#[test]
fn test_registry_from_config_file() {
    let config = Config::from_toml(
        r#"
        [routing]
        locale = "en"
        force_locale = true

        [[routes]]
        name = "account"
        pattern = "/en/account"
        page = "Account"
        middleware = ["auth"]

        [[routes]]
        name = "account"
        locale = "fr"
        pattern = "/fr/compte"
        page = "Account"
        middleware = ["auth"]

        [[routes]]
        name = "home"
        pattern = "/en"

        [routes.data]
        title = "Welcome"
        "#,
    )
    .unwrap();

    let set = MiddlewareSet::new().with("auth", middleware_fn(|_ctx| async { Ok(Payload::new()) }));
    let routes = Routes::from_config(&config, &set).unwrap();

    assert!(routes.force_locale());
    assert_eq!(routes.locales(), vec!["en", "fr"]);
    assert_eq!(routes.find_by_name("account", Some("fr")).unwrap().middlewares().len(), 1);

    let home = routes.find_by_name("home", None).unwrap();
    assert_eq!(home.page, "home");
    assert_eq!(home.data.get("title"), Some(&serde_json::json!("Welcome")));
}

#[test]
fn test_config_with_unknown_middleware_fails() {
    let config = Config::from_toml(
        r#"
        [[routes]]
        name = "admin"
        middleware = ["auth", "audit"]
        "#,
    )
    .unwrap();

    let set = MiddlewareSet::new().with("auth", middleware_fn(|_ctx| async { Ok(Payload::new()) }));
    let err = Routes::from_config(&config, &set).unwrap_err();
    assert!(matches!(err, RouteError::InvalidMiddlewareFunction { index: 1 }));
}
