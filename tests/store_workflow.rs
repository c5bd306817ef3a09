use reqtree::template;
use reqtree::{Document, Request, RequestTree, Storage};
use tempfile::TempDir;

#[test]
fn test_stored_request_resolves_against_empty_context() {
    let dir = TempDir::new().unwrap();
    let storage = Storage::new(dir.path().join("reqtree.json"));

    let document = storage.load();
    assert_eq!(document, Document::default());

    let document = storage
        .update(|doc| {
            doc.upsert(Request::new("GET", "http://a/{h}").with_header("{h}", "ignored"))
        })
        .unwrap();

    let stored = document.find("GET", "http://a/{h}").unwrap();
    let context = document.context.all_key_values("default");
    assert!(context.is_empty());

    let resolved = template::resolve(stored, &context);

    // request-level variables feed the url; they are never sent as headers
    assert_eq!(resolved.url.as_str(), "http://a/ignored");
    assert!(resolved.headers.is_empty());
    assert!(resolved.body.is_empty());
}

#[test]
fn test_unknown_placeholders_survive_resolution() {
    let request = Request::new("GET", "http://x/{id}").with_header("Authorization", "{token}");
    let context = Document::default().context.all_key_values("default");

    let resolved = template::resolve(&request, &context);

    assert_eq!(resolved.url.as_str(), "http://x/{id}");
    assert_eq!(template::placeholders(resolved.url.as_str()), vec!["{id}"]);
    assert!(!resolved.headers.contains_key("Authorization"));
}

#[test]
fn test_context_values_reach_url_and_headers() {
    let dir = TempDir::new().unwrap();
    let storage = Storage::new(dir.path().join("reqtree.json"));

    let document = storage
        .update(|doc| {
            doc.context.add("PROD", "{host}", "api.example.com");
            doc.context.add("prod", "{token}", "Bearer t0k");
            doc.upsert(
                Request::new("DELETE", "https://{host}/users/{id}")
                    .with_header("{id}", "17")
                    .with_header("Authorization", "{token}")
                    .with_header("Accept", "application/json"),
            );
        })
        .unwrap();

    assert_eq!(document.context.list_environments(), vec!["default", "prod"]);

    let request = document.find("DELETE", "https://{host}/users/{id}").unwrap();
    let resolved = template::resolve(request, &document.context.all_key_values("Prod"));

    assert_eq!(resolved.url.as_str(), "https://api.example.com/users/17");
    assert_eq!(resolved.headers.len(), 2);
    assert_eq!(resolved.headers["Authorization"], "Bearer t0k");
    assert_eq!(resolved.headers["Accept"], "application/json");
}

#[test]
fn test_tree_tracks_store_changes() {
    let dir = TempDir::new().unwrap();
    let storage = Storage::new(dir.path().join("reqtree.json"));

    let document = storage
        .update(|doc| {
            doc.config.pattern = "{m}{a}|{u}".to_string();
            doc.upsert(Request::new("GET", "http://shop/items").with_project("shop"));
            doc.upsert(Request::new("POST", "http://shop/items").with_project("shop").with_alias("create"));
            doc.upsert(Request::new("GET", "http://misc/ping"));
        })
        .unwrap();

    let mut tree = RequestTree::build(&document.grouped_by_project(), &document.config.pattern);
    let labels: Vec<&str> = tree.nodes().iter().map(|n| n.label()).collect();
    assert_eq!(labels, vec![".", "GET    ~/ping", "shop", "POST   create", "GET    ~/items"]);

    let selected = tree.select(4).unwrap();
    assert_eq!(tree.resolve(&document).unwrap().method.as_str(), "GET");

    // a reload from disk picks up the document as another process left it
    let document = storage
        .update(|doc| doc.remove(&Request::new("GET", "http://misc/ping")))
        .unwrap();
    tree.rebuild(&document.grouped_by_project(), &document.config.pattern);

    assert_eq!(tree.len(), 3);
    assert_eq!(tree.selected_key(), Some(&selected));
    assert_eq!(tree.cursor(), Some(2));
}
