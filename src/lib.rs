pub mod shared {
    pub mod core {
        pub mod errors;
        pub mod identity;
        pub mod request_context;
    }
    pub mod guards;
    pub mod infrastructure {
        pub mod connection;
        pub mod document_store;
        pub mod rate_limiter;
    }
    pub mod pipes {
        pub mod trim;
    }
}

pub mod modules {
    pub mod users {
        pub mod model;
        pub mod service;
        pub mod inbound {
            pub mod graphql;
        }
    }
    pub mod auth {
        pub mod jwt;
        pub mod password;
        pub mod service;
        pub mod inbound {
            pub mod graphql;
        }
    }
    pub mod activity_logs {
        pub mod model;
        pub mod service;
        pub mod inbound {
            pub mod graphql;
        }
    }
}

pub mod shell;

#[cfg(test)]
pub mod tests {
    pub mod fixtures {
        pub mod app;
        pub mod connection;
    }

    pub mod e2e {
        pub mod access_control_tests;
        pub mod gateway_tests;
        pub mod throttling_tests;
    }
}
