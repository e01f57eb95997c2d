use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{Error, Result};

use super::{AddressParser, AddressParserContext, ParseResponse};

/// Shared handle to the installed parser.
///
/// One writer sets it up or tears it down; any number of threads parse
/// through it. A parse clones the `Arc` and runs without holding the lock,
/// so a concurrent teardown only affects parses that start after it.
#[derive(Debug, Default)]
pub struct ParserModule {
    parser: RwLock<Option<Arc<AddressParser>>>,
}

impl ParserModule {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<Arc<AddressParser>>> {
        self.parser.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<Arc<AddressParser>>> {
        self.parser.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Loads the model directory and installs it. On failure the module is
    /// left not ready, even if a parser was installed before.
    pub fn setup(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        match AddressParser::load(dir) {
            Ok(parser) => {
                self.install(parser);
                Ok(())
            }
            Err(e) => {
                log::error!("address parser setup from {} failed: {e}", dir.display());
                *self.write() = None;
                Err(e)
            }
        }
    }

    pub fn install(&self, parser: AddressParser) {
        *self.write() = Some(Arc::new(parser));
    }

    /// Drops the installed parser. Parses already running keep their copy.
    pub fn teardown(&self) {
        if self.write().take().is_some() {
            log::info!("address parser torn down");
        }
    }

    pub fn is_ready(&self) -> bool {
        self.read().is_some()
    }

    pub fn parser(&self) -> Result<Arc<AddressParser>> {
        self.read().clone().ok_or(Error::NotReady)
    }

    pub fn parse(
        &self,
        address: &str,
        language: &str,
        country: &str,
        ctx: &mut AddressParserContext,
    ) -> Result<ParseResponse> {
        let parser = self.parser()?;
        Ok(parser.parse(address, language, country, ctx))
    }
}
