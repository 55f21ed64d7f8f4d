// Integration tests for RemoteSession against a fake WebDriver remote end
//
// These tests verify that:
// 1. Resolved options reach the new-session payload in W3C form
// 2. Session commands round-trip through the WebDriver HTTP protocol
// 3. WebDriver error bodies surface as typed errors
// 4. Closed sessions refuse further commands and close only once
// 5. Factory teardown deletes every remote session

mod test_server;

use mediawiki_fixtures::factory::{BrowserFactory, Config};
use mediawiki_fixtures::{BrowserKind, Error, RemoteSessionConstructor, Session, SessionConstructor};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use test_server::FakeWebDriver;

fn config(pairs: &[(&str, &str)]) -> Config {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[tokio::test]
async fn test_chrome_options_reach_payload() {
    init_tracing();
    let driver = FakeWebDriver::start().await;
    let factory = BrowserFactory::remote(BrowserKind::Chrome, &driver.url()).unwrap();

    factory
        .instance_for(&config(&[
            ("browser_language", "de"),
            ("browser_user_agent", "fixture-bot"),
        ]))
        .await
        .unwrap();

    let caps = driver.state().capabilities(0);
    assert_eq!(caps["browserName"], "chrome");
    assert_eq!(
        caps["goog:chromeOptions"]["prefs"]["intl.accept_languages"],
        "de"
    );
    assert_eq!(
        caps["goog:chromeOptions"]["args"],
        json!(["--user-agent=fixture-bot"])
    );

    driver.shutdown();
}

#[tokio::test]
async fn test_firefox_profile_reaches_payload() {
    let driver = FakeWebDriver::start().await;
    let factory = BrowserFactory::remote(BrowserKind::Firefox, &driver.url()).unwrap();

    factory
        .instance_for(&config(&[("browser_language", "fr"), ("headless", "true")]))
        .await
        .unwrap();

    let caps = driver.state().capabilities(0);
    assert_eq!(caps["browserName"], "firefox");
    assert_eq!(caps["moz:firefoxOptions"]["prefs"]["intl.accept_languages"], "fr");
    assert_eq!(caps["moz:firefoxOptions"]["args"], json!(["-headless"]));

    driver.shutdown();
}

#[tokio::test]
async fn test_navigate_and_current_url() {
    let driver = FakeWebDriver::start().await;
    let constructor = RemoteSessionConstructor::new(&driver.url()).unwrap();
    let factory = BrowserFactory::for_browser(BrowserKind::Firefox, Arc::new(constructor));
    let session = factory.instance_for(&Config::new()).await.unwrap();

    assert_eq!(session.current_url().await.unwrap(), "about:blank");

    session
        .navigate("http://wiki.local/wiki/Main_Page")
        .await
        .unwrap();
    assert_eq!(
        session.current_url().await.unwrap(),
        "http://wiki.local/wiki/Main_Page"
    );
    assert_eq!(
        driver.state().urls.lock().get(session.id()).map(String::as_str),
        Some("http://wiki.local/wiki/Main_Page")
    );

    driver.shutdown();
}

#[tokio::test]
async fn test_find_element() {
    let driver = FakeWebDriver::start().await;
    let factory = BrowserFactory::remote(BrowserKind::Firefox, &driver.url()).unwrap();
    let session = factory.instance_for(&Config::new()).await.unwrap();

    let element = session.find_element("#wpName1").await.unwrap();
    assert_eq!(element.id(), "element-wpName1");
    assert_eq!(element.session_id(), session.id());

    let missing = session.find_element("#missing").await.unwrap_err();
    match missing {
        Error::WebDriver { error, message } => {
            assert_eq!(error, "no such element");
            assert!(message.contains("#missing"));
        }
        other => panic!("expected WebDriver error, got {:?}", other),
    }

    driver.shutdown();
}

#[tokio::test]
async fn test_window_size_is_applied_after_creation() {
    let driver = FakeWebDriver::start().await;
    let factory = BrowserFactory::remote(BrowserKind::Chrome, &driver.url()).unwrap();

    let session = factory
        .instance_for(&config(&[("browser_width", "1280"), ("browser_height", "800")]))
        .await
        .unwrap();

    let rects = driver.state().window_rects.lock().clone();
    assert_eq!(rects.len(), 1);
    assert_eq!(rects[0].0, session.id());
    assert_eq!(rects[0].1, json!({ "width": 1280, "height": 800 }));

    driver.shutdown();
}

#[tokio::test]
async fn test_window_size_needs_both_dimensions() {
    let driver = FakeWebDriver::start().await;
    let factory = BrowserFactory::remote(BrowserKind::Chrome, &driver.url()).unwrap();

    factory
        .instance_for(&config(&[("browser_width", "1280")]))
        .await
        .unwrap();

    assert!(driver.state().window_rects.lock().is_empty());

    driver.shutdown();
}

#[tokio::test]
async fn test_window_size_failure_deletes_session() {
    let driver = FakeWebDriver::start().await;
    driver
        .state()
        .reject_window_rect
        .store(true, Ordering::SeqCst);
    let factory = BrowserFactory::remote(BrowserKind::Chrome, &driver.url()).unwrap();

    let err = factory
        .instance_for(&config(&[("browser_width", "10"), ("browser_height", "10")]))
        .await
        .err().expect("expected an error");

    match err {
        Error::Context(msg, source) => {
            assert_eq!(msg, "Failed to set window size");
            match *source {
                Error::WebDriver { error, .. } => assert_eq!(error, "invalid argument"),
                other => panic!("expected WebDriver error, got {:?}", other),
            }
        }
        other => panic!("expected context error, got {:?}", other),
    }
    assert_eq!(driver.state().sessions_created(), 1);
    assert_eq!(*driver.state().deleted.lock(), vec!["session-0".to_string()]);
    assert_eq!(factory.cached_sessions().await, 0);

    driver.shutdown();
}

#[tokio::test]
async fn test_non_json_error_keeps_http_status() {
    let driver = FakeWebDriver::start().await;
    // No grid hub on the fake driver, so this path answers with a text 404
    let endpoint = format!("{}/wd/hub", driver.url());
    let factory = BrowserFactory::remote(BrowserKind::Firefox, &endpoint).unwrap();

    let err = factory.instance_for(&Config::new()).await.err().expect("expected an error");
    match err {
        Error::SessionNotCreated(msg) => {
            assert!(msg.contains("404"), "unexpected message: {}", msg);
            assert!(msg.contains("Not Found"), "unexpected message: {}", msg);
        }
        other => panic!("expected SessionNotCreated, got {:?}", other),
    }
    assert!(driver.state().new_sessions.lock().is_empty());

    driver.shutdown();
}

#[tokio::test]
async fn test_close_is_idempotent_and_final() {
    let driver = FakeWebDriver::start().await;
    let constructor = RemoteSessionConstructor::new(&driver.url()).unwrap();
    let factory = BrowserFactory::for_browser(BrowserKind::Chrome, Arc::new(constructor.clone()));
    let options = factory.resolve(&Config::new()).unwrap();

    let session = constructor.construct(options).await.unwrap();
    let id = session.id().to_string();

    session.close().await.unwrap();
    session.close().await.unwrap();
    assert_eq!(*driver.state().deleted.lock(), vec![id]);

    let result = session.navigate("http://wiki.local/").await;
    assert!(matches!(result, Err(Error::SessionClosed(_))));

    driver.shutdown();
}

#[tokio::test]
async fn test_session_not_created_is_not_cached() {
    let driver = FakeWebDriver::start().await;
    let factory =
        BrowserFactory::remote(BrowserKind::Other("broken".to_string()), &driver.url()).unwrap();

    let err = factory.instance_for(&Config::new()).await.err().expect("expected an error");
    assert!(matches!(
        err,
        Error::SessionNotCreated(ref msg) if msg.contains("session not created")
    ));
    assert_eq!(factory.cached_sessions().await, 0);

    // Every request goes back to the remote end
    let _ = factory.instance_for(&Config::new()).await;
    assert_eq!(driver.state().new_sessions.lock().len(), 2);
    assert_eq!(driver.state().sessions_created(), 0);

    driver.shutdown();
}

#[tokio::test]
async fn test_unreachable_remote_end() {
    // Nothing listens on the discard port
    let factory = BrowserFactory::remote(BrowserKind::Firefox, "http://127.0.0.1:9").unwrap();

    let err = factory.instance_for(&Config::new()).await.err().expect("expected an error");
    assert!(matches!(err, Error::Http(_)));
    assert_eq!(factory.cached_sessions().await, 0);
}

#[tokio::test]
async fn test_equal_configurations_share_remote_session() {
    let driver = FakeWebDriver::start().await;
    let factory = BrowserFactory::remote(BrowserKind::Firefox, &driver.url()).unwrap();

    let first = factory
        .instance_for(&config(&[("browser_language", "de")]))
        .await
        .unwrap();
    let second = factory
        .instance_for(&config(&[("browser_language", "de")]))
        .await
        .unwrap();
    let third = factory
        .instance_for(&config(&[("browser_language", "en")]))
        .await
        .unwrap();

    assert_eq!(first.id(), second.id());
    assert_ne!(first.id(), third.id());
    assert_eq!(driver.state().sessions_created(), 2);

    driver.shutdown();
}

#[tokio::test]
async fn test_teardown_deletes_remote_sessions() {
    let driver = FakeWebDriver::start().await;
    let factory = BrowserFactory::remote(BrowserKind::Firefox, &driver.url()).unwrap();

    let first = factory
        .instance_for(&config(&[("browser_language", "de")]))
        .await
        .unwrap();
    let second = factory
        .instance_for(&config(&[("browser_language", "en")]))
        .await
        .unwrap();

    factory.teardown().await.unwrap();

    let mut deleted = driver.state().deleted.lock().clone();
    deleted.sort();
    let mut expected = vec![first.id().to_string(), second.id().to_string()];
    expected.sort();
    assert_eq!(deleted, expected);

    assert!(matches!(
        first.current_url().await,
        Err(Error::SessionClosed(_))
    ));

    driver.shutdown();
}
