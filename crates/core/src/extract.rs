//! Primitive extractors: turn raw tokens into typed values.
//!
//! Nothing here looks at the rest of the model; every function is a pure
//! mapping from tokens (plus variable substitution) to a value or an error
//! located at the offending token.

use crate::ast::{Item, Token, TokenKind};
use crate::context::BuildContext;
use crate::error::{ErrorKind, ModelError};
use crate::model::{BundledItem, Permissions, RequiredDevice, RequiredItem};
use std::path::{Path, PathBuf};

// ──────────────────────────────────────────────
// Scalars
// ──────────────────────────────────────────────

/// Parse an integer token. A trailing `K` multiplies by 1024.
pub fn int(token: &Token) -> Result<i64, ModelError> {
    let text = token.text.trim();
    let (digits, multiplier) = match text.strip_suffix('K') {
        Some(digits) => (digits, 1024),
        None => (text, 1),
    };
    digits
        .parse::<i64>()
        .ok()
        .and_then(|n| n.checked_mul(multiplier))
        .ok_or_else(|| {
            ModelError::new(
                ErrorKind::BadValue,
                &token.loc,
                format!("Invalid integer value '{}'.", token.text),
            )
        })
}

pub fn non_negative_int(token: &Token) -> Result<u64, ModelError> {
    let n = int(token)?;
    u64::try_from(n).map_err(|_| {
        ModelError::new(
            ErrorKind::BadValue,
            &token.loc,
            format!("Value must not be negative (got {}).", n),
        )
    })
}

pub fn positive_int(token: &Token) -> Result<u64, ModelError> {
    let n = int(token)?;
    if n <= 0 {
        return Err(ModelError::new(
            ErrorKind::BadValue,
            &token.loc,
            format!("Value must be greater than zero (got {}).", n),
        ));
    }
    Ok(n as u64)
}

/// Parse a bracketed permission token such as `[rw]`.
pub fn permissions(token: &Token) -> Result<Permissions, ModelError> {
    let bad = |msg: String| ModelError::new(ErrorKind::BadValue, &token.loc, msg);

    let flags = token
        .text
        .strip_prefix('[')
        .and_then(|t| t.strip_suffix(']'))
        .ok_or_else(|| bad(format!("Malformed permissions '{}'.", token.text)))?;

    let mut perms = Permissions::default();
    for flag in flags.chars() {
        match flag {
            'r' => perms.readable = true,
            'w' => perms.writeable = true,
            'x' => perms.executable = true,
            other => {
                return Err(bad(format!(
                    "Invalid permission flag '{}' in '{}'.",
                    other, token.text
                )))
            }
        }
    }
    Ok(perms)
}

/// Strip one pair of matching surrounding quotes, if present.
pub fn unquote(text: &str) -> &str {
    for quote in ['"', '\''] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            return &text[1..text.len() - 1];
        }
    }
    text
}

// ──────────────────────────────────────────────
// File system specs
// ──────────────────────────────────────────────

/// A destination ending in `/` names a directory; the source's last path
/// node is appended to it.
fn dest_path(src: &Path, dest: &str) -> PathBuf {
    if dest.ends_with('/') {
        match src.file_name() {
            Some(node) => Path::new(dest).join(node),
            None => PathBuf::from(dest),
        }
    } else {
        PathBuf::from(dest)
    }
}

fn path_text(token: &Token, cx: &BuildContext<'_>) -> Result<String, ModelError> {
    let expanded = cx.substitute_text(unquote(&token.text), token)?;
    Ok(unquote(&expanded).to_owned())
}

/// Split off an optional leading permissions token.
fn leading_permissions(item: &Item) -> Result<(Option<Permissions>, usize), ModelError> {
    match item.tokens.first() {
        Some(t) if t.kind == TokenKind::FilePermissions => Ok((Some(permissions(t)?), 1)),
        _ => Ok((None, 0)),
    }
}

/// `[perm] src dest` from a `bundles:` subsection. Relative sources are
/// resolved against `app_dir`.
pub fn bundled_item(
    item: &Item,
    app_dir: &Path,
    cx: &BuildContext<'_>,
) -> Result<BundledItem, ModelError> {
    let (perms, first) = leading_permissions(item)?;
    let src_token = item.token(first, "source path")?;
    let dest_token = item.token(first + 1, "destination path")?;

    let src = PathBuf::from(path_text(src_token, cx)?);
    let src_path = if src.is_absolute() {
        src
    } else {
        app_dir.join(src)
    };
    let dest_path = dest_path(&src_path, &path_text(dest_token, cx)?);

    Ok(BundledItem {
        src_path,
        dest_path,
        permissions: perms.unwrap_or_else(Permissions::read_only),
        loc: item.loc.clone(),
    })
}

fn absolute_source(token: &Token, cx: &BuildContext<'_>) -> Result<PathBuf, ModelError> {
    let src = PathBuf::from(path_text(token, cx)?);
    if !src.is_absolute() {
        return Err(ModelError::new(
            ErrorKind::BadPath,
            &token.loc,
            format!(
                "Required path must be absolute on the target: '{}'.",
                src.display()
            ),
        ));
    }
    Ok(src)
}

/// `src dest` from a `requires: file:` or `requires: dir:` subsection.
pub fn required_item(item: &Item, cx: &BuildContext<'_>) -> Result<RequiredItem, ModelError> {
    let src_path = absolute_source(item.token(0, "source path")?, cx)?;
    let dest = path_text(item.token(1, "destination path")?, cx)?;
    Ok(RequiredItem {
        dest_path: dest_path(&src_path, &dest),
        src_path,
        loc: item.loc.clone(),
    })
}

/// `[perm] src dest` from a `requires: device:` subsection.
pub fn required_device(item: &Item, cx: &BuildContext<'_>) -> Result<RequiredDevice, ModelError> {
    let (perms, first) = leading_permissions(item)?;
    if perms.is_some_and(|p| p.executable) {
        return Err(ModelError::new(
            ErrorKind::BadValue,
            &item.tokens[0].loc,
            "Execute permission is not allowed for devices.",
        ));
    }
    let src_path = absolute_source(item.token(first, "device path")?, cx)?;
    let dest = path_text(item.token(first + 1, "destination path")?, cx)?;
    Ok(RequiredDevice {
        dest_path: dest_path(&src_path, &dest),
        src_path,
        permissions: perms.unwrap_or_else(Permissions::read_only),
        loc: item.loc.clone(),
    })
}

/// `[perm] tree` from a `requires: configTree:` subsection. Returns the tree
/// name (`.` meaning `app_name`), its permissions, and the name token.
pub fn config_tree<'i>(
    item: &'i Item,
    app_name: &str,
) -> Result<(String, Permissions, &'i Token), ModelError> {
    let (perms, first) = leading_permissions(item)?;
    let name_token = item.token(first, "configuration tree name")?;
    let name = if name_token.kind == TokenKind::Dot {
        app_name.to_owned()
    } else {
        name_token.text.clone()
    };
    Ok((name, perms.unwrap_or_else(Permissions::read_only), name_token))
}
