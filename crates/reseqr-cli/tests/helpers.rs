use std::fs;
use std::path::{Path, PathBuf};

pub const METS_GEN_A: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<METS:mets xmlns:METS="http://www.loc.gov/METS/">
  <METS:structMap>
    <METS:div DMDID="C0" TYPE="CITATION">
      <METS:div ORDER="1" LABEL="page one" TYPE="PAGE">
        <METS:fptr FILEID="FIMG-JP2-GenA_0001"/>
      </METS:div>
      <METS:div ORDER="2" LABEL="page two" TYPE="PAGE">
        <METS:fptr FILEID="FIMG-JP2-GenA_0002"/>
      </METS:div>
    </METS:div>
  </METS:structMap>
</METS:mets>
"#;

pub const METS_GEN_B: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<METS:mets xmlns:METS="http://www.loc.gov/METS/">
  <METS:structMap>
    <METS:div DMDID="C0" TYPE="CITATION">
      <METS:div ORDER="1" LABEL="page one" TYPE="PAGE">
        <METS:fptr FILEID="FIMG-JP2-GenB_0001"/>
      </METS:div>
    </METS:div>
  </METS:structMap>
</METS:mets>
"#;

/// A throwaway project with one batch "B1": two groups on disk, a METS
/// document per group, and a config file pointing at it all.
pub struct Fixture {
    pub tmp: tempfile::TempDir,
    pub config: PathBuf,
}

impl Fixture {
    pub fn batch_root(&self) -> PathBuf {
        self.tmp.path().join("projects").join("B1")
    }

    pub fn group(&self, key: &str) -> PathBuf {
        self.batch_root().join(key)
    }
}

pub fn setup_fixture() -> Fixture {
    let tmp = tempfile::tempdir().expect("tempdir");
    let root = tmp.path();

    let gen_a = root.join("projects/B1/GenA");
    let gen_b = root.join("projects/B1/GenB");
    fs::create_dir_all(&gen_a).expect("GenA");
    fs::create_dir_all(&gen_b).expect("GenB");
    fs::write(gen_a.join("GenA_0001.jp2"), b"a1").expect("file");
    fs::write(gen_a.join("GenA_0002.jp2"), b"a2").expect("file");
    fs::write(gen_b.join("GenB_0001.jp2"), b"b1").expect("file");

    let mets = root.join("mets/B1/mets");
    fs::create_dir_all(&mets).expect("mets dir");
    fs::write(mets.join("genA.xml"), METS_GEN_A).expect("mets doc");
    fs::write(mets.join("genB.xml"), METS_GEN_B).expect("mets doc");

    let config = root.join("reseqr.toml");
    fs::write(
        &config,
        format!(
            r#"
default_project = "test"

[projects.test]
project_name = "Integration Test"
project_path = "{}"
mets_path = "{}"
local_renaming_prefix = "R_"
imaging_services_prefix = "FIMG-JP2-"
"#,
            root.join("projects").display(),
            root.join("mets").display()
        ),
    )
    .expect("config");

    Fixture { tmp, config }
}

pub fn reseqr_cmd(fixture: &Fixture) -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::cargo_bin("reseqr").expect("binary built");
    cmd.arg("--config").arg(&fixture.config).arg("--no-color");
    // keep the rolling log out of the source tree
    cmd.current_dir(fixture.tmp.path());
    cmd
}

pub fn read_report(fixture: &Fixture) -> String {
    fs::read_to_string(fixture.batch_root().join("B1-report.txt")).expect("report written")
}

#[allow(dead_code)]
pub fn exists(path: &Path) -> bool {
    path.exists()
}
