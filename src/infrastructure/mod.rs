// Clients for the external services the backend depends on.

pub mod gemini;
pub mod identity;
pub mod page;

pub use gemini::{GeminiClient, GenerationError, GenerationRequest, InlineImage, ListGenerator};
pub use identity::{AuthUser, IdentityError, IdentityProvider, SupabaseIdentity};
pub use page::{PageError, PageReader, WebPageReader};
