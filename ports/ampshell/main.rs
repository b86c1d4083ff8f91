/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Runs one page through the embed and render-delay pipeline: upgrades its
//! custom elements, creates frames for the embeds that pass validation and
//! waits on the render-delaying extensions the page declares.

mod manifest;

use std::io::{self, Write};
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;
use std::{env, fs, process};

use amp_config::{Preferences, amp_version};
use amp_element::ElementRegistry;
use amp_iframe::{FrameLoadQueue, FrameNameAllocator, IframeContext, install_iframe};
use amp_render_gate::{GateOutcome, RenderGate, ServiceRegistry};
use getopts::Options;
use log::{debug, error, info, warn};

use crate::manifest::PageManifest;

/// What happened to a page, printed once the run is over.
#[derive(Debug, Default)]
struct Report {
    rejected: usize,
    frames_loaded: usize,
    frames_failed: usize,
    render: Option<GateOutcome>,
}

fn print_usage(app: &str, opts: &Options) {
    let message = format!(
        "Usage: {} [ options ... ] MANIFEST\n\twhere options include",
        app
    );
    println!("{}", opts.usage(&message));
}

/// The name to show in usage messages. The argument list can be empty when
/// the process was started without an `argv[0]`.
fn app_name(args: &[String]) -> String {
    args.first()
        .cloned()
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_owned())
}

fn args_fail(msg: &str) -> ! {
    let _ = writeln!(io::stderr(), "{}", msg);
    process::exit(1)
}

fn load_preferences(prefs_file: Option<String>, overrides: &[String]) -> Preferences {
    let mut prefs = match prefs_file {
        Some(path) => {
            let json = fs::read_to_string(&path)
                .unwrap_or_else(|err| args_fail(&format!("Couldn't read {}: {}", path, err)));
            Preferences::from_json(&json)
                .unwrap_or_else(|err| args_fail(&format!("Couldn't parse {}: {}", path, err)))
        },
        None => Preferences::default(),
    };
    for pref in overrides {
        if let Err(err) = prefs.set_from_command_line(pref) {
            args_fail(&format!("error: {}", err));
        }
    }
    prefs
}

async fn run(prefs: Preferences, manifest: PageManifest) -> Report {
    let page = manifest.to_page();
    let mut report = Report::default();

    let services = ServiceRegistry::new();
    let gate = RenderGate::new(prefs.render_delay.clone(), Arc::new(services.clone()));

    let queue = Rc::new(FrameLoadQueue::new());
    let names = FrameNameAllocator::new(&prefs.iframe.name_prefix);
    let mut registry = ElementRegistry::new();
    install_iframe(
        &mut registry,
        IframeContext::new(prefs.iframe.clone(), names, queue.clone()),
    );

    for (extension, delay) in &manifest.ready_after_ms {
        let services = services.clone();
        let extension = extension.clone();
        let page_id = page.id();
        let delay = Duration::from_millis(*delay);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            services.signal_ready(page_id, &extension);
        });
    }

    let render_wait = gate.wait_for_extensions(&page);

    let mut loads = Vec::new();
    for element in page.elements() {
        let Some(mut host) = registry.upgrade(element.clone()) else {
            continue;
        };
        if let Err(err) = host.attach(&page) {
            warn!("<{}> rejected: {}", element.local_name(), err);
            report.rejected += 1;
            continue;
        }
        match host.load_content(&page) {
            Ok(Some(load)) => loads.push(load),
            Ok(None) => debug!("<{}> has nothing to load", element.local_name()),
            Err(err) => {
                warn!("<{}> not loaded: {}", element.local_name(), err);
                report.rejected += 1;
            },
        }
    }

    for (frame, signal) in queue.drain() {
        let src = frame.get_attribute("src").unwrap_or_default();
        if manifest.failing_frames.iter().any(|failing| failing == src) {
            signal.failed(&format!("{} did not respond", src));
        } else {
            signal.loaded();
        }
    }

    report.render = match render_wait {
        None => {
            info!("Showing {} right away", page.url());
            None
        },
        Some(wait) => {
            let outcome = wait.await;
            match outcome {
                GateOutcome::AllReady => info!("Showing {}", page.url()),
                GateOutcome::TimedOut => warn!("Showing {} before its extensions are ready", page.url()),
            }
            Some(outcome)
        },
    };

    for load in loads {
        match load.await {
            Ok(()) => report.frames_loaded += 1,
            Err(err) => {
                error!("{}", err);
                report.frames_failed += 1;
            },
        }
    }

    services.remove_page(page.id());
    report
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = env::args().collect();
    let app_name = app_name(&args);

    let mut opts = Options::new();
    opts.optopt("", "prefs", "Load preferences from a JSON file", "prefs.json");
    opts.optmulti(
        "",
        "pref",
        "Set a preference",
        "render_delay.timeout_ms=500",
    );
    opts.optflag("v", "version", "Display the version and exit");
    opts.optflag("h", "help", "Print this message");

    let opt_match = match opts.parse(args.iter().skip(1)) {
        Ok(m) => m,
        Err(f) => args_fail(&f.to_string()),
    };

    if opt_match.opt_present("h") {
        print_usage(&app_name, &opts);
        process::exit(0);
    }
    if opt_match.opt_present("v") {
        println!("{}", amp_version());
        process::exit(0);
    }

    let prefs = load_preferences(opt_match.opt_str("prefs"), &opt_match.opt_strs("pref"));

    let Some(manifest_path) = opt_match.free.first() else {
        print_usage(&app_name, &opts);
        process::exit(1);
    };
    let manifest = fs::read_to_string(manifest_path)
        .map_err(|err| err.to_string())
        .and_then(|json| PageManifest::from_json(&json).map_err(|err| err.to_string()))
        .unwrap_or_else(|err| args_fail(&format!("Couldn't load {}: {}", manifest_path, err)));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap_or_else(|err| args_fail(&format!("Couldn't start runtime: {}", err)));
    let report = runtime.block_on(run(prefs, manifest));

    let render = match report.render {
        None => "immediate",
        Some(GateOutcome::AllReady) => "all ready",
        Some(GateOutcome::TimedOut) => "timed out",
    };
    println!(
        "render: {}, frames loaded: {}, frames failed: {}, rejected: {}",
        render, report.frames_loaded, report.frames_failed, report.rejected
    );
}
