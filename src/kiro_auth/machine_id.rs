use crate::error::KeeperError;
use std::path::Path;
use uuid::Uuid;

/// Produce a fresh machine identity: a lowercase UUIDv4, the format the IDE
/// generates for itself on first launch.
pub fn generate_machine_id() -> String {
    Uuid::new_v4().to_string().to_lowercase()
}

/// Accepts the two shapes the IDE has used historically: a UUID, or a
/// 64-character hex digest.
pub fn is_valid_machine_id(id: &str) -> bool {
    if Uuid::parse_str(id).is_ok() {
        return true;
    }
    id.len() == 64 && id.chars().all(|c| c.is_ascii_hexdigit())
}

/// Read the machine identity currently applied to the local IDE, if any.
pub fn read_machine_id(path: &Path) -> Result<Option<String>, KeeperError> {
    match std::fs::read_to_string(path) {
        Ok(s) => {
            let id = s.trim().to_string();
            Ok(if id.is_empty() { None } else { Some(id) })
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Persist a machine identity as the one applied to the local IDE.
pub fn write_machine_id(path: &Path, id: &str) -> Result<(), KeeperError> {
    if !is_valid_machine_id(id) {
        return Err(KeeperError::MachineIdentity(format!(
            "not a valid machine id: {id}"
        )));
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, id)?;
    Ok(())
}
