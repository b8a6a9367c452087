#![allow(dead_code)]

use std::{
    fs,
    path::{Path, PathBuf},
};

use assert_cmd::Command;
use hostctl::test_utils::{recorded_lines, recording_script, supervisor_script};
use nix::unistd::{User, getuid};
use tempfile::{TempDir, tempdir};

/// A throwaway box: every path from the settings file lives under one temp
/// directory and the external programs are recording scripts.
pub struct TestBox {
    _temp: TempDir,
    pub root: PathBuf,
    pub settings_path: PathBuf,
}

impl TestBox {
    pub fn new() -> Self {
        Self::build(0, &[])
    }

    pub fn with_failing_acme() -> Self {
        Self::build(1, &[])
    }

    pub fn with_failing_services(failing: &[&str]) -> Self {
        Self::build(0, failing)
    }

    fn build(acme_exit: i32, failing_services: &[&str]) -> Self {
        let temp = tempdir().expect("failed to create tempdir");
        let root = temp.path().to_path_buf();
        let bin = root.join("bin");
        fs::create_dir_all(&bin).expect("failed to create bin dir");
        fs::create_dir_all(root.join("conf.d")).expect("failed to create conf.d");

        let acme = recording_script(&bin, "acme.sh", &root.join("acme.log"), acme_exit);
        let supervisor =
            supervisor_script(&bin, &root.join("supervisor.log"), failing_services);
        let user = User::from_uid(getuid())
            .expect("failed to look up current user")
            .expect("current user has no passwd entry");

        let settings_path = root.join("manage.yaml");
        fs::write(
            &settings_path,
            format!(
                r#"web_root: {root}/www
vhost_dir: {root}/conf.d
cert_root: {root}/sslcerts
acme_home: {root}/acme
acme_client: {acme}
supervisor_ctl: {supervisor}
web_server_service: nginx
web_server_user: {user}
reload_command: manage restart nginx
nginx_log_dir: {root}/log
index_file: {root}/state/hosts.json
"#,
                root = root.display(),
                acme = acme.display(),
                supervisor = supervisor.display(),
                user = user.name,
            ),
        )
        .expect("failed to write settings");

        Self {
            _temp: temp,
            root,
            settings_path,
        }
    }

    /// `manage --config <settings>` ready for further arguments.
    pub fn manage(&self) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("manage"));
        cmd.arg("--config").arg(&self.settings_path);
        cmd
    }

    pub fn vhost_file(&self, domain: &str) -> PathBuf {
        self.root.join("conf.d").join(format!("{domain}.conf"))
    }

    pub fn cert_dir(&self, domain: &str) -> PathBuf {
        self.root.join("sslcerts").join(domain)
    }

    pub fn acme_calls(&self) -> Vec<String> {
        recorded_lines(&self.root.join("acme.log"))
    }

    pub fn supervisor_calls(&self) -> Vec<String> {
        recorded_lines(&self.root.join("supervisor.log"))
    }

    pub fn listed_hosts(&self) -> Vec<String> {
        let output = self
            .manage()
            .args(["host", "ls"])
            .output()
            .expect("failed to run host ls");
        assert!(output.status.success());
        let mut hosts: Vec<String> = String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::to_string)
            .collect();
        hosts.sort();
        hosts
    }
}

pub fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|err| panic!("failed to read {path:?}: {err}"))
}
