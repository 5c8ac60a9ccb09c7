mod identity;

pub use identity::{
    IdentityMiddlewareFactory,
    IdentityMiddlewareService,
    PRINCIPAL_HEADER,
    PRINCIPAL_SIGNATURE_HEADER,
};
