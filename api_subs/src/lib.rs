use actix_web::web::{self};

pub mod reconcile {
    pub mod classify;
    pub mod customers;
    pub mod driver;
    pub mod event;
    pub mod resolve;
}

pub mod routes {
    pub mod pay;
}

mod services {
    pub(crate) mod pay;
}

mod dtos {
    pub(crate) mod pay;
}

pub fn mount_pay() -> actix_web::Scope {
    web::scope("/stripe").service(routes::pay::post_checkout_session)
}

pub fn mount_webhook() -> actix_web::Scope {
    web::scope("/webhook").service(routes::pay::post_webhook)
}
