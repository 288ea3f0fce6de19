//! `strata dump-db`: validate a design database and print it back as
//! normalized JSON.

use std::path::Path;

use strata_db::MemDb;

use crate::GlobalArgs;

/// Runs the `strata dump-db` command.
pub fn run(design: &str, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let db = MemDb::load(Path::new(design))?;
    println!("{}", db.to_json()?);
    if !global.quiet {
        eprintln!("   Validated {} object(s)", db.len());
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use strata_db::ObjectKind;
    use tempfile::TempDir;

    fn global() -> GlobalArgs {
        GlobalArgs {
            quiet: true,
            color: false,
            config: None,
        }
    }

    #[test]
    fn valid_database_dumps() {
        let mut db = MemDb::new();
        let design = db.obj(ObjectKind::Design).name("d").finish();
        db.set_root(design);
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("d.json");
        fs::write(&path, db.to_json().unwrap()).unwrap();
        assert_eq!(run(&path.display().to_string(), &global()).unwrap(), 0);
    }

    #[test]
    fn missing_root_is_rejected() {
        let mut db = MemDb::new();
        db.obj(ObjectKind::Module).name("m").finish();
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("d.json");
        fs::write(&path, db.to_json().unwrap()).unwrap();
        assert!(run(&path.display().to_string(), &global()).is_err());
    }

    #[test]
    fn missing_file_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("absent.json");
        assert!(run(&path.display().to_string(), &global()).is_err());
    }
}
