// ABOUTME: Integration tests for remote builds.
// ABOUTME: Fakes the provisioning tools and inspects the uploaded payload.

mod support;

use containmint::commands::{Build, BuildOptions, Execute, Host};
use containmint::engine::EngineKind;
use containmint::error::Error;
use containmint::remote::{Arch, RemoteTarget};
use containmint::types::ImageReference;
use flate2::read::GzDecoder;
use parking_lot::Mutex;
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use support::fake_runner::{FakeRunner, Reply};
use tempfile::TempDir;

const HOST_VARS: &str =
    r#"{"ansible_host":"192.0.2.10","ansible_python_interpreter":"/usr/bin/python3.9"}"#;

/// Everything the fake unarchive saw in the uploaded payload.
#[derive(Default)]
struct Upload {
    entries: Vec<String>,
    config: String,
}

fn args_value<'a>(command: &'a [String], flag: &str) -> &'a str {
    let index = command.iter().position(|arg| arg == flag).unwrap();
    &command[index + 1]
}

/// A runner that answers inventory queries and records the uploaded payload.
fn runner(upload: Arc<Mutex<Upload>>) -> FakeRunner {
    FakeRunner::new()
        .stdout(&["ansible-inventory"], HOST_VARS)
        .on(&["ansible", "-m", "unarchive"], move |invocation| {
            let module_args = args_value(&invocation.command, "-a");
            let src = module_args
                .strip_prefix("src=")
                .and_then(|rest| rest.split(' ').next())
                .unwrap();

            let mut archive = tar::Archive::new(GzDecoder::new(File::open(src).unwrap()));
            let mut upload = upload.lock();
            for entry in archive.entries().unwrap() {
                let mut entry = entry.unwrap();
                let name = entry.path().unwrap().display().to_string();
                if name.ends_with("/config.json") {
                    entry.read_to_string(&mut upload.config).unwrap();
                }
                upload.entries.push(name);
            }
            Reply::Stdout(String::new())
        })
}

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let context = dir.path().join("context");
        fs::create_dir(&context).unwrap();
        fs::write(context.join("Dockerfile"), "FROM scratch\n").unwrap();
        fs::write(dir.path().join("script"), "#!/usr/bin/env python3\n").unwrap();
        fs::write(dir.path().join("binary"), [0x7f, b'E', b'L', b'F', 2, 1, 1, 0]).unwrap();
        Self { dir }
    }

    fn build(&self, program: &str, keep_instance: bool) -> Build {
        self.build_with_login(program, keep_instance, false)
    }

    fn build_with_login(&self, program: &str, keep_instance: bool, login: bool) -> Build {
        let options = BuildOptions {
            context: self.dir.path().join("context"),
            tag: ImageReference::parse("quay.io/org/image:1.0-aarch64").unwrap(),
            push: true,
            login,
            squash: None,
        };
        Build::new(
            options,
            RemoteTarget::new("rhel/9.0", Arch::Aarch64),
            keep_instance,
            self.dir.path().join(program),
        )
    }
}

fn host(runner: &Arc<FakeRunner>) -> Host {
    support::host(runner, EngineKind::Podman)
}

fn workdir_of(entries: &[String]) -> String {
    let first = entries.first().unwrap();
    Path::new(first)
        .components()
        .next()
        .unwrap()
        .as_os_str()
        .to_string_lossy()
        .into_owned()
}

/// Test: the full remote sequence for a native binary.
#[tokio::test]
async fn native_program_is_dispatched_directly() {
    let fixture = Fixture::new();
    let upload = Arc::new(Mutex::new(Upload::default()));
    let runner = Arc::new(runner(upload.clone()));

    fixture.build("binary", false).run(&host(&runner)).await.unwrap();

    let invocations = runner.invocations();
    assert_eq!(invocations.len(), 4);

    let export = &invocations[0].command;
    assert_eq!(
        export[..8],
        [
            "ansible-test",
            "shell",
            "--target-posix",
            "remote:rhel/9.0,arch=aarch64",
            "--color",
            "-v",
            "--truncate",
            "0"
        ]
    );
    assert_eq!(export[8], "--export");
    let inventory = &export[9];
    assert!(inventory.ends_with(".inventory"));

    let host_vars = &invocations[1];
    assert_eq!(
        host_vars.command,
        ["ansible-inventory", "-i", inventory.as_str(), "--host", "testhost"]
    );
    assert!(host_vars.capture);

    let unarchive = &invocations[2];
    assert!(args_value(&unarchive.command, "-a").ends_with(" dest=/root"));
    assert_eq!(unarchive.command.last().map(String::as_str), Some("testhost"));
    assert_eq!(
        unarchive.env.get("ANSIBLE_HOST_KEY_CHECKING").map(String::as_str),
        Some("no")
    );

    let upload = upload.lock();
    let workdir = workdir_of(&upload.entries);
    assert!(workdir.starts_with("workdir-"));
    for name in ["containmint", "config.json", "context/Dockerfile"] {
        assert!(upload.entries.contains(&format!("{workdir}/{name}")), "{name}");
    }

    let dispatch = &invocations[3].command;
    let tail: Vec<&str> = dispatch[8..].iter().map(String::as_str).collect();
    let program = format!("/root/{workdir}/containmint");
    assert_eq!(
        tail,
        ["--remote-terminate", "always", "--raw", "--", program.as_str(), "dispatch"]
    );
}

/// Test: the shipped config points at the remote context and keeps the options.
#[tokio::test]
async fn shipped_config_targets_remote_context() {
    let fixture = Fixture::new();
    let upload = Arc::new(Mutex::new(Upload::default()));
    let runner = Arc::new(runner(upload.clone()));

    fixture.build("binary", false).run(&host(&runner)).await.unwrap();

    let upload = upload.lock();
    let workdir = workdir_of(&upload.entries);

    let config = fixture.dir.path().join("shipped.json");
    fs::write(&config, &upload.config).unwrap();
    let execute = Execute::deserialize(&config).unwrap();

    assert_eq!(
        execute.options().context,
        Path::new("/root").join(&workdir).join("context")
    );
    assert_eq!(execute.options().tag.to_string(), "quay.io/org/image:1.0-aarch64");
    assert!(execute.options().push);
    assert!(execute.credentials().is_none());
}

/// Test: script programs run through the discovered interpreter, and the
/// instance is kept on request.
#[tokio::test]
async fn script_program_uses_remote_interpreter() {
    let fixture = Fixture::new();
    let upload = Arc::new(Mutex::new(Upload::default()));
    let runner = Arc::new(runner(upload.clone()));

    fixture.build("script", true).run(&host(&runner)).await.unwrap();

    let dispatch = &runner.invocations()[3].command;
    assert!(!dispatch.iter().any(|arg| arg == "--remote-terminate"));
    assert_eq!(dispatch[8], "--raw");
    assert_eq!(dispatch[10], "/usr/bin/python3.9");
    assert_eq!(dispatch.last().map(String::as_str), Some("dispatch"));
}

/// Test: unusable inventory output stops the build before any upload.
#[tokio::test]
async fn bad_inventory_is_a_remote_error() {
    let fixture = Fixture::new();
    let runner = Arc::new(FakeRunner::new().stdout(&["ansible-inventory"], "{}"));

    let err = fixture
        .build("binary", false)
        .run(&host(&runner))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Remote(_)));
    assert_eq!(runner.count("ansible -m unarchive"), 0);
    assert_eq!(runner.count("ansible-test"), 1);
}

/// Test: a failed provisioning stops the build.
#[tokio::test]
async fn failed_provisioning_propagates() {
    let fixture = Fixture::new();
    let runner = Arc::new(FakeRunner::new().fail(&["ansible-test"]));

    let err = fixture
        .build("binary", false)
        .run(&host(&runner))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Subprocess(_)));
    assert_eq!(runner.commands().len(), 1);
}

/// Test: login credentials from the environment travel in the shipped config.
#[test]
fn login_credentials_are_shipped() {
    temp_env::with_vars(
        [
            ("CONTAINMINT_USERNAME", Some("robot")),
            ("CONTAINMINT_PASSWORD", Some("build-shipped-password")),
        ],
        || {
            let fixture = Fixture::new();
            let upload = Arc::new(Mutex::new(Upload::default()));
            let runner = Arc::new(runner(upload.clone()));

            support::block_on(fixture.build_with_login("binary", false, true).run(&host(&runner)))
                .unwrap();

            let config: serde_json::Value =
                serde_json::from_str(&upload.lock().config).unwrap();
            assert_eq!(config["login"], true);
            assert_eq!(config["username"], "robot");
            assert_eq!(config["password"], "build-shipped-password");
        },
    );
}

/// Test: missing credentials stop a login build before any instance is requested.
#[test]
fn missing_credentials_fail_before_provisioning() {
    temp_env::with_vars_unset(["CONTAINMINT_USERNAME", "CONTAINMINT_PASSWORD"], || {
        let fixture = Fixture::new();
        let runner = Arc::new(FakeRunner::new());

        let err =
            support::block_on(fixture.build_with_login("binary", false, true).run(&host(&runner)))
                .unwrap_err();

        assert!(matches!(err, Error::MissingEnvVar(ref name) if name == "CONTAINMINT_USERNAME"));
        assert!(runner.commands().is_empty());
    });
}
