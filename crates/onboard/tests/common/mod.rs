use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const CONFIG: &str = r#"
region: us-east-1
profile: acme-admin
account_number: "123456789012"
account_moniker: acme
configservice_s3_bucket_name: acme-config
configservice_sns_topic_name: config-topic
configservice_iam_role_name: config-role
flow_iam_role_name: flow-role
shib_saml_provider: shibboleth
shib_role_name: shib-admin
shib_role_policy: arn:aws:iam::aws:policy/AdministratorAccess
cs_role_name: shib-cs
cs_role_policy: arn:aws:iam::aws:policy/ReadOnlyAccess
nacls:
  - { protocol: tcp, rule: allow, cidr: 10.0.0.0/8, from: 22, to: 22 }
  - { protocol: all, rule: allow, cidr: 10.0.0.0/8 }
iam_passwd_policy:
  minimum_password_length: 14
vpc_cidr: 10.92.0.0/22
public_subnets:
  - { az: a, cidr: 10.92.0.0/24 }
"#;

pub struct TestProject {
    pub root: TempDir,
}

impl TestProject {
    /// onboard.yml とリポジトリの templates/ を持つプロジェクト
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let project = Self { root };
        project.write_config(CONFIG);
        project.copy_templates();
        project
    }

    pub fn empty() -> Self {
        Self {
            root: tempfile::tempdir().unwrap(),
        }
    }

    pub fn write_config(&self, content: &str) {
        fs::write(self.root.path().join("onboard.yml"), content).unwrap();
    }

    pub fn write_template(&self, name: &str, content: &str) {
        fs::write(self.path().join("templates").join(name), content).unwrap();
    }

    fn copy_templates(&self) {
        let source = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../templates");
        let target = self.path().join("templates");
        fs::create_dir_all(&target).unwrap();
        for entry in fs::read_dir(source).unwrap() {
            let entry = entry.unwrap();
            fs::copy(entry.path(), target.join(entry.file_name())).unwrap();
        }
        // IdP メタデータはアカウントごとに用意されるのでダミー
        fs::write(
            target.join("shibidp-md.xml"),
            "<EntityDescriptor entityID=\"https://idp.example.edu/idp/shibboleth\"/>",
        )
        .unwrap();
    }

    pub fn path(&self) -> PathBuf {
        self.root.path().to_path_buf()
    }

    /// `onboard` をプロジェクト直下で、環境変数の影響なしに実行
    #[allow(deprecated)]
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("onboard").unwrap();
        cmd.current_dir(self.path())
            .env_remove("ONBOARD_CONFIG")
            .env_remove("ONBOARD_PROFILE")
            .env_remove("ONBOARD_REGION")
            .env_remove("RUST_LOG")
            .env("NO_COLOR", "1");
        cmd
    }
}
