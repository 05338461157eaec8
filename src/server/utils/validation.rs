use crate::core::constants::MAX_NAME_LENGTH;
use crate::core::prelude::*;

/// Folder and script names must stay a single entry below the scripts root.
pub fn validate_name(kind: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(AppError::Validation(format!("{} name cannot be empty", kind)));
    }

    if name.len() > MAX_NAME_LENGTH {
        return Err(AppError::Validation(format!("{} name too long", kind)));
    }

    if name.starts_with('.') {
        return Err(AppError::Validation(format!(
            "{} name cannot start with '.'",
            kind
        )));
    }

    if name
        .chars()
        .any(|c| c == '/' || c == '\\' || c == '\0' || c.is_control())
    {
        return Err(AppError::Validation(format!(
            "{} name contains invalid characters",
            kind
        )));
    }

    Ok(())
}

pub fn validate_folder_name(name: &str) -> Result<()> {
    validate_name("Folder", name)
}

/// Wrong extension is `Forbidden`, everything else `Validation`.
pub fn validate_script_name(name: &str, extension: &str) -> Result<()> {
    validate_name("Script", name)?;
    if !has_script_extension(name, extension) {
        return Err(AppError::Forbidden(format!(
            "Only {} files are served",
            extension
        )));
    }
    Ok(())
}

pub fn has_script_extension(name: &str, extension: &str) -> bool {
    name.len() > extension.len() && name.ends_with(extension)
}

/// `folder/name`, the identity used by analytics.
pub fn script_identity(folder: &str, name: &str) -> String {
    format!("{}/{}", folder, name)
}
