//! Handler registry: per `(category, method)` key, one handler instance per worker, so
//! handlers may keep per-worker mutable state without synchronization. Backed by an
//! `IndexMap` keyed store, split into disjoint authenticated/unauthenticated keyspaces.
use crate::handler::Handler;
use crate::response::ResponseCode;
use crate::schema::HandlerSchema;
use indexmap::IndexMap;

/// A factory for one handler type, registered once at node start.
pub struct Registration {
    pub key: u16,
    pub required_auth_level: u8,
    pub authenticated: bool,
    pub make: fn() -> Box<dyn Handler>,
}

impl Registration {
    pub fn of<H>(authenticated: bool, make: fn() -> Box<dyn Handler>) -> Registration
    where
        H: HandlerSchema,
    {
        Registration {
            key: H::registry_key(),
            required_auth_level: H::REQUIRED_AUTH_LEVEL,
            authenticated,
            make,
        }
    }
}

pub struct HandlerRegistry {
    worker_count: usize,
    unauthenticated: IndexMap<u16, Vec<Box<dyn Handler>>>,
    authenticated: IndexMap<u16, Vec<Box<dyn Handler>>>,
}

impl HandlerRegistry {
    pub fn new(worker_count: usize, registrations: Vec<Registration>) -> HandlerRegistry {
        let mut unauthenticated = IndexMap::new();
        let mut authenticated = IndexMap::new();

        for reg in registrations {
            let instances: Vec<Box<dyn Handler>> = (0..worker_count).map(|_| (reg.make)()).collect();
            if reg.authenticated {
                authenticated.insert(reg.key, instances);
            } else {
                unauthenticated.insert(reg.key, instances);
            }
        }

        HandlerRegistry {
            worker_count,
            unauthenticated,
            authenticated,
        }
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Select the worker-local handler instance for `(category, method)` from the map
    /// applicable to the connection's current authentication state.
    pub fn resolve(
        &mut self,
        worker: usize,
        is_authenticated: bool,
        category: u8,
        method: u8,
    ) -> Result<&mut Box<dyn Handler>, ResponseCode> {
        let key = (category as u16) << 8 | method as u16;
        let map = if is_authenticated {
            &mut self.authenticated
        } else {
            &mut self.unauthenticated
        };

        map.get_mut(&key)
            .and_then(|slots| slots.get_mut(worker))
            .ok_or(ResponseCode::INVALID_REQUEST_TYPE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{DbContext, DbError};
    use crate::handler::Notification;
    use crate::wire::WireError;
    use arke_support::AuthenticatedId;
    use std::io::{Read, Write};

    struct Ping;

    impl Handler for Ping {
        fn deserialize_input(&mut self, _r: &mut dyn Read) -> Result<(), WireError> {
            Ok(())
        }
        fn serialize_output(&mut self, _w: &mut dyn Write) -> Result<(), WireError> {
            Ok(())
        }
        fn is_valid(&self) -> ResponseCode {
            ResponseCode::SUCCESS
        }
        fn process(
            &mut self,
            _db: &mut dyn DbContext,
            _auth: &mut AuthenticatedId,
        ) -> Result<ResponseCode, DbError> {
            Ok(ResponseCode::SUCCESS)
        }
        fn drain_notifications(&mut self) -> Vec<Notification> {
            Vec::new()
        }
        fn category(&self) -> u8 {
            1
        }
        fn method(&self) -> u8 {
            1
        }
        fn required_auth_level(&self) -> u8 {
            0
        }
    }

    #[test]
    fn unknown_method_is_rejected() {
        let mut registry = HandlerRegistry::new(
            2,
            vec![Registration {
                key: 0x0101,
                required_auth_level: 0,
                authenticated: false,
                make: || Box::new(Ping),
            }],
        );

        assert!(registry.resolve(0, false, 1, 1).is_ok());
        assert_eq!(
            registry.resolve(0, false, 9, 9).err(),
            Some(ResponseCode::INVALID_REQUEST_TYPE)
        );
        // authenticated map is separate from unauthenticated
        assert_eq!(
            registry.resolve(0, true, 1, 1).err(),
            Some(ResponseCode::INVALID_REQUEST_TYPE)
        );
    }

    #[test]
    fn each_worker_gets_its_own_instance() {
        let registry = HandlerRegistry::new(
            3,
            vec![Registration {
                key: 0x0101,
                required_auth_level: 0,
                authenticated: false,
                make: || Box::new(Ping),
            }],
        );

        assert_eq!(registry.worker_count(), 3);
    }
}
