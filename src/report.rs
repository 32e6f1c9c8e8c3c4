/*!
Error printer for `main`. The top-level error comes first, then each underlying cause on
its own numbered line.
*/

use std::{error::Error as StdError, fmt, iter};

type BoxedError = Box<dyn StdError + 'static>;

pub struct Report(BoxedError);

impl Report {
    /// The reported error followed by its sources, outermost first.
    pub fn chain(&self) -> impl Iterator<Item = &(dyn StdError + 'static)> {
        iter::successors(Some(&*self.0), |&error| error.source())
    }
}

impl fmt::Debug for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut chain = self.chain();
        if let Some(error) = chain.next() {
            writeln!(f, "{}", error)?;
        }

        for (depth, cause) in chain.enumerate() {
            if depth == 0 {
                writeln!(f, "\nCaused by:")?;
            }
            writeln!(f, "  {}: {}", depth, cause)?;
        }

        Ok(())
    }
}

impl<E: Into<BoxedError>> From<E> for Report {
    fn from(error: E) -> Self {
        Report(error.into())
    }
}
