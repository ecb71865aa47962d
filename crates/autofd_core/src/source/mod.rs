//! Bundled source collaborator for `.sfn` scalar-function modules.
//!
//! A module is every `.sfn` file under one import path. Resolution finds a
//! function or a `Type.method` in it and hands back a [`ResolvedCallable`]
//! whose returned expressions are already lowered into the closed grammar.
//!
//! Two resolvers are provided:
//! - [`SourceSet`]: in-memory sources keyed by import path.
//! - [`SourceTree`]: a directory root, where an import path is a
//!   sub-directory.

pub mod ast;
pub mod lower;
pub mod parser;

use crate::autodiff::Dual;
use crate::error::ResolutionError;
use crate::eval::{compile, VM};
use crate::rewrite::rewrite;
use crate::traits::Resolve;
use crate::types::{Param, ResolvedCallable, Signature};
use ast::{FnDecl, Item, SourceFile};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Extension of scalar-function source files.
pub const SOURCE_EXTENSION: &str = "sfn";

/// The parsed files of one import path.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub path: String,
    pub files: Vec<SourceFile>,
}

enum Symbol<'a> {
    Fn(&'a FnDecl),
    Struct,
    Const,
}

impl Symbol<'_> {
    fn kind(&self) -> &'static str {
        match self {
            Symbol::Fn(_) => "fn",
            Symbol::Struct => "struct",
            Symbol::Const => "const",
        }
    }
}

impl Module {
    /// Parses `(file name, text)` pairs into a module.
    pub fn parse<'a>(
        path: &str,
        sources: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, ResolutionError> {
        let files = sources
            .into_iter()
            .map(|(file, text)| {
                parser::parse_source(text).map_err(|message| ResolutionError::Parse {
                    file: file.to_string(),
                    message,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            path: path.to_string(),
            files,
        })
    }

    fn items(&self) -> impl Iterator<Item = &Item> {
        self.files.iter().flat_map(|file| file.items.iter())
    }

    fn lookup(&self, name: &str) -> Option<Symbol<'_>> {
        self.items().find_map(|item| match item {
            Item::Fn(decl) if decl.name == name => Some(Symbol::Fn(decl)),
            Item::Struct { name: n } if n == name => Some(Symbol::Struct),
            Item::Const { name: n, .. } if n == name => Some(Symbol::Const),
            _ => None,
        })
    }

    fn method(&self, ty: &str, method: &str) -> Option<&FnDecl> {
        self.items()
            .filter_map(|item| match item {
                Item::Impl { ty: t, methods } if t == ty => Some(methods),
                _ => None,
            })
            .flatten()
            .find(|decl| decl.name == method)
    }

    /// Finds `name` (a function, or `Type.method`) and lowers it.
    pub fn resolve(&self, name: &str) -> Result<ResolvedCallable, ResolutionError> {
        let not_found = |symbol: &str| ResolutionError::SymbolNotFound {
            symbol: symbol.to_string(),
            path: self.path.clone(),
        };

        let decl = match name.split_once('.') {
            Some((ty, method)) => {
                match self.lookup(ty).ok_or_else(|| not_found(ty))? {
                    Symbol::Struct => {}
                    other => {
                        return Err(ResolutionError::NotANamedType {
                            symbol: ty.to_string(),
                            path: self.path.clone(),
                            kind: other.kind().to_string(),
                        })
                    }
                }
                self.method(ty, method).ok_or_else(|| not_found(name))?
            }
            None => match self.lookup(name).ok_or_else(|| not_found(name))? {
                Symbol::Fn(decl) => decl,
                other => {
                    return Err(ResolutionError::NotAFunction {
                        symbol: name.to_string(),
                        path: self.path.clone(),
                        kind: other.kind().to_string(),
                    })
                }
            },
        };

        trace!(path = %self.path, name, "resolved declaration");
        Ok(ResolvedCallable {
            name: name.to_string(),
            signature: Signature {
                receiver: decl.receiver,
                params: decl
                    .params
                    .iter()
                    .map(|(name, ty)| Param {
                        name: name.clone(),
                        ty: ty.clone(),
                    })
                    .collect(),
                results: decl.results.clone(),
            },
            body: lower::lower_body(&decl.body),
        })
    }

    /// Values of module-level constants that fold to a number, in
    /// declaration order so later constants may use earlier ones.
    pub fn constants(&self) -> HashMap<String, f64> {
        let mut known = HashMap::new();
        for item in self.items() {
            if let Item::Const { name, value, .. } = item {
                if let Some(v) = fold_constant(value, &known) {
                    known.insert(name.clone(), v);
                }
            }
        }
        known
    }
}

/// Folds a constant initializer by running it through the rewrite and the
/// evaluator with no differentiation variable.
fn fold_constant(value: &ast::Expr, known: &HashMap<String, f64>) -> Option<f64> {
    let lowered = lower::lower_expr(value).ok()?;
    let rewritten = rewrite(&lowered, "").ok()?;
    let bytecode = compile(&rewritten, known).ok()?;
    let result: Dual = VM::execute(&bytecode, 0.0, &mut Vec::new());
    Some(result.real)
}

/// In-memory sources, keyed by import path.
#[derive(Debug, Clone, Default)]
pub struct SourceSet {
    modules: BTreeMap<String, Vec<(String, String)>>,
}

impl SourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one file to the module at `path`.
    pub fn add(&mut self, path: &str, file: &str, text: &str) {
        self.modules
            .entry(path.to_string())
            .or_default()
            .push((file.to_string(), text.to_string()));
    }

    pub fn with(mut self, path: &str, file: &str, text: &str) -> Self {
        self.add(path, file, text);
        self
    }

    pub fn module(&self, path: &str) -> Result<Module, ResolutionError> {
        let files = self
            .modules
            .get(path)
            .ok_or_else(|| ResolutionError::PackageNotFound(path.to_string()))?;
        Module::parse(
            path,
            files.iter().map(|(file, text)| (file.as_str(), text.as_str())),
        )
    }
}

impl Resolve for SourceSet {
    fn resolve(&self, path: &str, name: &str) -> Result<ResolvedCallable, ResolutionError> {
        self.module(path)?.resolve(name)
    }

    fn constants(&self, path: &str) -> Result<HashMap<String, f64>, ResolutionError> {
        Ok(self.module(path)?.constants())
    }
}

/// Modules on disk: import path `a/b` is the directory `<root>/a/b`.
#[derive(Debug, Clone)]
pub struct SourceTree {
    root: PathBuf,
}

impl SourceTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn module(&self, path: &str) -> Result<Module, ResolutionError> {
        let dir = self.root.join(path);
        if !dir.is_dir() {
            return Err(ResolutionError::PackageNotFound(path.to_string()));
        }
        let io_err = |source| ResolutionError::Io {
            path: path.to_string(),
            source,
        };

        let mut files = Vec::new();
        for entry in fs::read_dir(&dir).map_err(io_err)? {
            let file = entry.map_err(io_err)?.path();
            if file.is_file() && file.extension().is_some_and(|ext| ext == SOURCE_EXTENSION) {
                files.push(file);
            }
        }
        if files.is_empty() {
            return Err(ResolutionError::PackageNotFound(path.to_string()));
        }
        files.sort();

        let mut sources = Vec::with_capacity(files.len());
        for file in &files {
            let text = fs::read_to_string(file).map_err(io_err)?;
            sources.push((file.display().to_string(), text));
        }
        trace!(path, files = sources.len(), "loaded module");
        Module::parse(
            path,
            sources.iter().map(|(file, text)| (file.as_str(), text.as_str())),
        )
    }
}

impl Resolve for SourceTree {
    fn resolve(&self, path: &str, name: &str) -> Result<ResolvedCallable, ResolutionError> {
        self.module(path)?.resolve(name)
    }

    fn constants(&self, path: &str) -> Result<HashMap<String, f64>, ResolutionError> {
        Ok(self.module(path)?.constants())
    }
}
