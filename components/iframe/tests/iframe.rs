/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::rc::Rc;

use amp_config::IframePrefs;
use amp_element::{
    CustomElement, Element, ElementRegistry, Error, LayoutBox, Page, ViewportSize,
};
use amp_iframe::{
    AmpIframe, EmbedState, FrameLoadQueue, FrameNameAllocator, IframeContext, assert_position,
    assert_source, install_iframe, min_top,
};

const CONTAINER: &str = "https://pub.example/article.html";

fn prefs() -> IframePrefs {
    IframePrefs::default()
}

fn context(queue: &Rc<FrameLoadQueue>, names: &FrameNameAllocator) -> IframeContext {
    IframeContext::new(prefs(), names.clone(), queue.clone())
}

fn page() -> Page {
    Page::new(CONTAINER, ViewportSize::new(400.0, 800.0))
}

fn embed(src: &str) -> Element {
    Element::new("amp-iframe")
        .with_attribute("src", src)
        .with_attribute("width", "300")
        .with_attribute("height", "250")
        .with_layout_box(LayoutBox::new(900.0, 0.0, 300.0, 250.0))
}

#[test]
fn test_https_source_is_returned_unchanged() {
    assert_eq!(
        assert_source(
            "https://example.com/a",
            "https://pub.example",
            Some("allow-scripts"),
            &prefs()
        ),
        Ok("https://example.com/a".to_owned())
    );
    // No normalization of the declared string.
    assert_eq!(
        assert_source("HTTPS://Example.com:443/a/../b", CONTAINER, None, &prefs()),
        Ok("HTTPS://Example.com:443/a/../b".to_owned())
    );
}

#[test]
fn test_non_https_sources_are_rejected() {
    for src in [
        "http://example.com/a",
        "ftp://example.com/a",
        "data:text/html,<p>hi</p>",
        "javascript:alert(1)",
        "file:///etc/passwd",
        "http://iframe.localhost/no-port",
        "http://evil.example/?http://iframe.localhost:8000",
        "http://[::1/unterminated",
    ] {
        assert_eq!(
            assert_source(src, CONTAINER, Some("allow-scripts"), &prefs()),
            Err(Error::InvalidSourceScheme {
                src: src.to_owned()
            }),
            "{}",
            src
        );
    }
}

#[test]
fn test_local_test_origin_is_allowed_and_configurable() {
    let src = "http://iframe.localhost:8000/frame.html";
    assert!(assert_source(src, CONTAINER, None, &prefs()).is_ok());

    let strict = IframePrefs {
        test_origin_prefix: None,
        ..IframePrefs::default()
    };
    assert!(matches!(
        assert_source(src, CONTAINER, None, &strict),
        Err(Error::InvalidSourceScheme { .. })
    ));
}

#[test]
fn test_same_origin_sandbox_collision() {
    assert_eq!(
        assert_source(
            "https://pub.example/x",
            "https://pub.example",
            Some("allow-same-origin"),
            &prefs()
        ),
        Err(Error::SandboxOriginCollision {
            src: "https://pub.example/x".to_owned(),
            container: "https://pub.example".to_owned(),
        })
    );

    for sandbox in [
        "allow-scripts allow-same-origin",
        "  allow-same-origin\tallow-forms ",
        "allow-forms\nallow-same-origin",
        "ALLOW-SAME-ORIGIN",
    ] {
        assert!(
            matches!(
                assert_source("https://pub.example/x", CONTAINER, Some(sandbox), &prefs()),
                Err(Error::SandboxOriginCollision { .. })
            ),
            "{:?}",
            sandbox
        );
    }

    // Relative sources resolve against the container.
    assert!(matches!(
        assert_source("/widget.html", CONTAINER, Some("allow-same-origin"), &prefs()),
        Err(Error::SandboxOriginCollision { .. })
    ));
}

#[test]
fn test_collision_is_reported_regardless_of_scheme() {
    assert!(matches!(
        assert_source(
            "http://pub.example/x",
            "http://pub.example/",
            Some("allow-same-origin"),
            &prefs()
        ),
        Err(Error::SandboxOriginCollision { .. })
    ));
}

#[test]
fn test_same_origin_without_the_token_is_allowed() {
    for sandbox in [None, Some(""), Some("allow-scripts"), Some("allow-same-origins")] {
        assert!(
            assert_source("https://pub.example/x", CONTAINER, sandbox, &prefs()).is_ok(),
            "{:?}",
            sandbox
        );
    }
    // Cross-origin frames may be granted same-origin trust.
    assert!(
        assert_source(
            "https://other.example/x",
            CONTAINER,
            Some("allow-same-origin"),
            &prefs()
        )
        .is_ok()
    );
}

#[test]
fn test_malformed_container_never_collides() {
    assert!(
        assert_source(
            "https://pub.example/x",
            "::garbage::",
            Some("allow-same-origin"),
            &prefs()
        )
        .is_ok()
    );
}

#[test]
fn test_position_boundary() {
    let prefs = prefs();
    // Small viewports use 75% of their height.
    assert_eq!(min_top(400.0, &prefs), 300.0);
    // Large viewports are capped at 600px.
    assert_eq!(min_top(2000.0, &prefs), 600.0);

    for (viewport_height, top, ok) in [
        (400.0, 299.9, false),
        (400.0, 300.0, true),
        (400.0, 301.0, true),
        (2000.0, 599.0, false),
        (2000.0, 600.0, true),
        (800.0, 0.0, false),
        (0.0, 0.0, true),
    ] {
        let result = assert_position(
            LayoutBox::new(top, 0.0, 100.0, 100.0),
            viewport_height,
            &prefs,
        );
        assert_eq!(result.is_ok(), ok, "top {} in {}", top, viewport_height);
    }

    assert_eq!(
        assert_position(LayoutBox::new(10.0, 0.0, 1.0, 1.0), 800.0, &prefs),
        Err(Error::PositionTooHigh {
            top: 10.0,
            min_top: 600.0
        })
    );
}

#[test]
fn test_nan_position_is_rejected() {
    let result = assert_position(LayoutBox::new(f64::NAN, 0.0, 1.0, 1.0), 800.0, &prefs());
    assert!(matches!(result, Err(Error::PositionTooHigh { .. })));
}

#[tokio::test]
async fn test_frame_is_created_after_both_checks() {
    let queue = Rc::new(FrameLoadQueue::new());
    let names = FrameNameAllocator::new("amp_iframe");
    let mut iframe = AmpIframe::new(context(&queue, &names));
    let page = page();
    let element = embed("https://example.com/a")
        .with_attribute("sandbox", "allow-scripts allow-forms")
        .with_attribute("frameborder", "0")
        .with_attribute("allowfullscreen", "")
        .with_attribute("title", "ignored");

    iframe.first_attached_callback(&element, &page).unwrap();
    assert_eq!(
        iframe.state(),
        &EmbedState::Attached {
            src: Some("https://example.com/a".to_owned())
        }
    );
    assert!(iframe.frame().is_none());

    let handle = iframe.load_content(&element, &page).unwrap().unwrap();
    assert_eq!(
        iframe.state(),
        &EmbedState::FrameCreated {
            src: "https://example.com/a".to_owned()
        }
    );

    let frame = iframe.frame().unwrap();
    assert_eq!(frame.local_name(), "iframe");
    assert_eq!(frame.get_attribute("src"), Some("https://example.com/a"));
    assert_eq!(frame.get_attribute("name"), Some("amp_iframe0"));
    assert_eq!(frame.get_attribute("sandbox"), Some("allow-scripts allow-forms"));
    assert_eq!(frame.get_attribute("width"), Some("300"));
    assert_eq!(frame.get_attribute("height"), Some("250"));
    assert_eq!(frame.get_attribute("frameborder"), Some("0"));
    assert_eq!(frame.get_attribute("allowfullscreen"), Some(""));
    assert!(!frame.has_attribute("allowtransparency"));
    assert!(!frame.has_attribute("title"));
    assert!(frame.has_class("-amp-fill-content"));

    let (_, signal) = queue.take("amp_iframe0").unwrap();
    signal.loaded();
    assert_eq!(handle.await, Ok(()));
}

#[test]
fn test_sandbox_is_always_present() {
    let queue = Rc::new(FrameLoadQueue::new());
    let names = FrameNameAllocator::new("amp_iframe");
    let page = page();
    for (declared, expected) in [(None, ""), (Some(""), ""), (Some("allow-popups"), "allow-popups")] {
        let mut element = embed("https://example.com/a");
        if let Some(sandbox) = declared {
            element.set_attribute("sandbox", sandbox);
        }
        let mut iframe = AmpIframe::new(context(&queue, &names));
        iframe.first_attached_callback(&element, &page).unwrap();
        iframe.load_content(&element, &page).unwrap().unwrap();
        assert_eq!(iframe.frame().unwrap().get_attribute("sandbox"), Some(expected));
    }
}

#[test]
fn test_frame_names_are_unique_and_increasing() {
    let queue = Rc::new(FrameLoadQueue::new());
    let names = FrameNameAllocator::new("amp_iframe");
    let page = page();
    let mut created = Vec::new();
    for _ in 0..5 {
        let element = embed("https://example.com/a");
        let mut iframe = AmpIframe::new(context(&queue, &names));
        iframe.first_attached_callback(&element, &page).unwrap();
        iframe.load_content(&element, &page).unwrap();
        let name = iframe.frame().unwrap().get_attribute("name").unwrap().to_owned();
        created.push(name["amp_iframe".len()..].parse::<u64>().unwrap());
    }
    assert_eq!(created, [0, 1, 2, 3, 4]);
    assert_eq!(queue.pending_names().len(), 5);

    // A name read elsewhere is never handed out again.
    assert_eq!(names.next_name(), "amp_iframe5");
    let element = embed("https://example.com/a");
    let mut iframe = AmpIframe::new(context(&queue, &names));
    iframe.first_attached_callback(&element, &page).unwrap();
    iframe.load_content(&element, &page).unwrap();
    assert_eq!(iframe.frame().unwrap().get_attribute("name"), Some("amp_iframe6"));
}

#[test]
fn test_invalid_source_makes_element_inert() {
    let queue = Rc::new(FrameLoadQueue::new());
    let names = FrameNameAllocator::new("amp_iframe");
    let page = page();
    let element = embed("http://example.com/a");
    let mut iframe = AmpIframe::new(context(&queue, &names));

    assert!(matches!(
        iframe.first_attached_callback(&element, &page),
        Err(Error::InvalidSourceScheme { .. })
    ));
    assert_eq!(iframe.state(), &EmbedState::Inert);
    assert!(iframe.load_content(&element, &page).unwrap().is_none());
    assert!(iframe.frame().is_none());
    assert!(queue.is_empty());
    assert_eq!(names.next_name(), "amp_iframe0");
}

#[test]
fn test_missing_source_is_an_empty_embed() {
    let queue = Rc::new(FrameLoadQueue::new());
    let names = FrameNameAllocator::new("amp_iframe");
    let page = page();
    // Too high on the page, but without a source there is nothing to check.
    for element in [
        Element::new("amp-iframe").with_attribute("sandbox", "allow-same-origin"),
        Element::new("amp-iframe").with_attribute("src", ""),
    ] {
        let mut iframe = AmpIframe::new(context(&queue, &names));
        iframe.first_attached_callback(&element, &page).unwrap();
        assert_eq!(iframe.state(), &EmbedState::Attached { src: None });
        assert!(iframe.load_content(&element, &page).unwrap().is_none());
        assert_eq!(iframe.state(), &EmbedState::Attached { src: None });
    }
    assert!(queue.is_empty());
}

#[test]
fn test_position_is_checked_when_loading() {
    let queue = Rc::new(FrameLoadQueue::new());
    let names = FrameNameAllocator::new("amp_iframe");
    let page = page();
    let mut element = embed("https://example.com/a").with_layout_box(LayoutBox::new(100.0, 0.0, 300.0, 250.0));
    let mut iframe = AmpIframe::new(context(&queue, &names));

    // Attaching does not look at the position.
    iframe.first_attached_callback(&element, &page).unwrap();
    assert_eq!(
        iframe.load_content(&element, &page).unwrap_err(),
        Error::PositionTooHigh {
            top: 100.0,
            min_top: 600.0
        }
    );
    assert!(iframe.frame().is_none());
    assert!(queue.is_empty());

    // A later layout pass sees the new position.
    element.set_layout_box(LayoutBox::new(600.0, 0.0, 300.0, 250.0));
    assert!(iframe.load_content(&element, &page).unwrap().is_some());
    assert_eq!(queue.len(), 1);
}

#[test]
fn test_content_is_loaded_once() {
    let queue = Rc::new(FrameLoadQueue::new());
    let names = FrameNameAllocator::new("amp_iframe");
    let page = page();
    let element = embed("https://example.com/a");
    let mut iframe = AmpIframe::new(context(&queue, &names));

    assert_eq!(
        iframe.load_content(&element, &page).unwrap_err(),
        Error::NotAttached
    );
    iframe.first_attached_callback(&element, &page).unwrap();
    assert!(iframe.load_content(&element, &page).unwrap().is_some());
    assert!(iframe.load_content(&element, &page).unwrap().is_none());
    assert_eq!(queue.len(), 1);

    iframe.detached_callback();
    assert!(iframe.frame().is_none());
    assert_eq!(
        iframe.state(),
        &EmbedState::Attached {
            src: Some("https://example.com/a".to_owned())
        }
    );
}

#[test]
fn test_reattached_element_loads_into_a_fresh_frame() {
    let queue = Rc::new(FrameLoadQueue::new());
    let names = FrameNameAllocator::new("amp_iframe");
    let mut registry = ElementRegistry::new();
    install_iframe(&mut registry, context(&queue, &names));
    let page = page();
    let mut host = registry.upgrade(embed("https://example.com/a")).unwrap();

    host.attach(&page).unwrap();
    host.detach();
    host.attach(&page).unwrap();
    assert!(host.is_attached());
    assert!(host.load_content(&page).unwrap().is_some());

    host.detach();
    host.attach(&page).unwrap();
    assert!(host.load_content(&page).unwrap().is_some());

    let iframe = host
        .implementation()
        .as_any()
        .downcast_ref::<AmpIframe>()
        .unwrap();
    let frame = iframe.frame().unwrap();
    assert_eq!(frame.get_attribute("name"), Some("amp_iframe1"));
    assert_eq!(frame.get_attribute("src"), Some("https://example.com/a"));
    assert_eq!(queue.pending_names(), ["amp_iframe0", "amp_iframe1"]);
}

#[test]
fn test_reattached_inert_element_stays_empty() {
    let queue = Rc::new(FrameLoadQueue::new());
    let names = FrameNameAllocator::new("amp_iframe");
    let mut registry = ElementRegistry::new();
    install_iframe(&mut registry, context(&queue, &names));
    let page = page();
    let mut host = registry.upgrade(embed("http://example.com/a")).unwrap();

    assert!(host.attach(&page).is_err());
    host.detach();
    assert!(matches!(
        host.attach(&page),
        Err(Error::InvalidSourceScheme { .. })
    ));
    assert!(queue.is_empty());
}

#[tokio::test]
async fn test_frame_error_rejects_the_load_handle() {
    let queue = Rc::new(FrameLoadQueue::new());
    let names = FrameNameAllocator::new("amp_iframe");
    let page = page();
    let element = embed("https://example.com/missing");
    let mut iframe = AmpIframe::new(context(&queue, &names));
    iframe.first_attached_callback(&element, &page).unwrap();
    let handle = iframe.load_content(&element, &page).unwrap().unwrap();

    let (_, signal) = queue.drain().pop().unwrap();
    signal.failed("net::ERR_NAME_NOT_RESOLVED");
    assert_eq!(
        handle.await,
        Err(Error::FrameLoadFailed("net::ERR_NAME_NOT_RESOLVED".to_owned()))
    );
}

#[tokio::test]
async fn test_registered_element_through_the_host() {
    let queue = Rc::new(FrameLoadQueue::new());
    let names = FrameNameAllocator::new("amp_iframe");
    let mut registry = ElementRegistry::new();
    install_iframe(&mut registry, context(&queue, &names));
    let page = page();

    let mut good = registry.upgrade(embed("https://example.com/a")).unwrap();
    let mut bad = registry
        .upgrade(embed("https://pub.example/x").with_attribute("sandbox", "allow-same-origin"))
        .unwrap();

    assert!(matches!(
        bad.attach(&page),
        Err(Error::SandboxOriginCollision { .. })
    ));
    // A failing sibling does not affect this one.
    good.attach(&page).unwrap();
    let handle = good.load_content(&page).unwrap().unwrap();

    let iframe = good
        .implementation()
        .as_any()
        .downcast_ref::<AmpIframe>()
        .unwrap();
    assert_eq!(iframe.frame().unwrap().get_attribute("name"), Some("amp_iframe0"));

    queue.take("amp_iframe0").unwrap().1.loaded();
    assert_eq!(handle.await, Ok(()));
}

#[test]
fn test_only_size_defined_layouts_are_supported() {
    let queue = Rc::new(FrameLoadQueue::new());
    let names = FrameNameAllocator::new("amp_iframe");
    let mut registry = ElementRegistry::new();
    install_iframe(&mut registry, context(&queue, &names));

    let mut host = registry
        .upgrade(Element::new("amp-iframe").with_attribute("src", "https://example.com/a"))
        .unwrap();
    assert_eq!(
        host.attach(&page()),
        Err(Error::UnsupportedLayout("container".to_owned()))
    );
}
