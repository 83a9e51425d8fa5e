//! Central plumbing between CLI commands and library functions.

use std::{io::Write, path::Path};

use thiserror::Error;

use typedblocks::{
    block::BlockKind,
    codegen::{self, GenError},
    config::{Config, ConfigLoadError},
    import::{self, ImportError},
    unique::BlockId,
    workspace::Workspace,
};

/// The public result type of the [`driver`] module.
///
/// [`driver`]: self
pub type Result<T = ()> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    ConfigLoad(#[from] ConfigLoadError),
    #[error("{0}")]
    Import(#[from] ImportError),
    #[error("{0}")]
    Gen(#[from] GenError),
}

impl Error {
    /// The numeric import outcome code, for errors that have one.
    pub fn code(&self) -> Option<u8> {
        match self {
            Error::Import(err) => Some(err.code().into()),
            Error::Io(_) | Error::ConfigLoad(_) | Error::Gen(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Context {
    pub config: Config,
}

impl Context {
    /// Loads the config at `config_path`, or discovers one in the current
    /// directory.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        let config = Config::discover(config_path, &cwd)?;
        Ok(Self { config })
    }

    /// Prints one line for every item of the program at `path`: `- : TYPE`
    /// for an expression, `val NAME : TYPE` for a top-level `let`, and
    /// `type NAME` for a datatype.
    pub fn check(&self, path: &Path, out: &mut impl Write) -> Result {
        let (ws, tops) = self.import_file(path)?;
        for top in tops {
            let Some(block) = ws.block(top) else {
                continue;
            };
            match block.kind() {
                BlockKind::LetStatement { value, .. } => {
                    let name = ws.value_name(*value).unwrap_or_default();
                    if let Some(var) = ws.bindings().get_value_by_id(*value) {
                        writeln!(out, "val {name} : {}", ws.store().display(var.ty()))?;
                    }
                }
                BlockKind::Datatype { name, .. } => writeln!(out, "type {name}")?,
                _ => {
                    if let Some(ty) = ws.type_of(top) {
                        writeln!(out, "- : {}", ws.store().display(ty))?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Prints the code generated from the blocks of the program at `path`.
    pub fn generate(&self, path: &Path, out: &mut impl Write) -> Result {
        let (ws, _) = self.import_file(path)?;
        let code = codegen::generate_program(&ws, &self.config.generator)?;
        writeln!(out, "{code}")?;
        Ok(())
    }

    fn import_file(&self, path: &Path) -> Result<(Workspace, Vec<BlockId>)> {
        let source = std::fs::read_to_string(path)?;
        let mut ws = Workspace::with_unify_orphans(self.config.inference.unify_orphans);

        tracing::info!(path = %path.display(), "importing program");
        let tops = import::import(&mut ws, &source)?;
        Ok((ws, tops))
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use pretty_assertions::assert_eq;

    use super::{Context, Error};

    fn write_program(name: &str, source: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "typedblocks-driver-{}-{name}.ml",
            std::process::id()
        ));
        std::fs::write(&path, source).unwrap();
        path
    }

    #[test]
    fn check_prints_one_type_per_expression() {
        let path = write_program("check", "1;; fun x -> x +. 1.0");
        let mut out = Vec::new();
        Context::default().check(&path, &mut out).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "- : INT\n- : FLOAT -> FLOAT\n");
    }

    #[test]
    fn check_prints_statements_by_name() {
        let path = write_program("statements", "let inc x = x + 1;; type t = A;; inc 2");
        let mut out = Vec::new();
        Context::default().check(&path, &mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "val inc : INT -> INT\ntype t\n- : INT\n"
        );
    }

    #[test]
    fn generate_prints_the_program() {
        let path = write_program("gen", "let x = 1 in   x");
        let mut out = Vec::new();
        Context::default().generate(&path, &mut out).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "let x = 1 in x\n");
    }

    #[test]
    fn import_errors_carry_their_code() {
        let path = write_program("undefined", "y + 1");
        let err = Context::default().check(&path, &mut Vec::new()).unwrap_err();

        assert_eq!(err.code(), Some(4));
        assert_eq!(err.to_string(), "undefined variable: y");
    }

    #[test]
    fn missing_files_are_io_errors() {
        let err = Context::default()
            .check(&PathBuf::from("/no/such/program.ml"), &mut Vec::new())
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.code(), None);
    }
}
