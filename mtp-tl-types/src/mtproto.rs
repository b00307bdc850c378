//! Service constructors and functions from the MTProto schema that the
//! request layer builds or inspects directly.

/// Declare a single-constructor TL type: the struct plus its
/// [`Serializable`](crate::Serializable), [`Deserializable`](crate::Deserializable),
/// [`Identifiable`](crate::Identifiable) and [`Bare`](crate::Bare) impls.
/// Fields are written and read in declaration order.
macro_rules! tl_constructor {
    (
        $(#[$meta:meta])*
        $name:ident = $id:expr, $tl_name:literal {
            $( $(#[$fmeta:meta])* $field:ident : $ty:ty ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq)]
        pub struct $name {
            $( $(#[$fmeta])* pub $field: $ty, )*
        }

        impl $crate::Identifiable for $name {
            fn constructor_id(&self) -> $crate::TypeId { $id }
        }

        impl $crate::Serializable for $name {
            fn serialized_len(&self) -> usize {
                0 $( + $crate::Serializable::serialized_len(&self.$field) )*
            }
            fn serialize(&self, buf: &mut $crate::Buffer) {
                $( $crate::Serializable::serialize(&self.$field, buf); )*
            }
        }

        impl $crate::Deserializable for $name {
            const BARE_ID: $crate::TypeId = $id;

            fn deserialize(
                buf: &mut $crate::Cursor<'_>,
                cons: $crate::TypeId,
            ) -> $crate::deserialize::Result<Self> {
                if cons != $id {
                    return Err($crate::deserialize::Error::UnexpectedConstructor {
                        id: cons,
                        type_name: $tl_name,
                    });
                }
                Ok(Self {
                    $( $field: <$ty as $crate::Deserializable>::deserialize(
                        buf,
                        <$ty as $crate::Deserializable>::BARE_ID,
                    )?, )*
                })
            }
        }

        impl $crate::Bare for $name {}
    };
}

/// Constructors (bare types).
pub mod types {
    use crate::{Boxed, Bytes, Vector, ids};

    tl_constructor! {
        /// `rpc_error#2144ca19 error_code:int error_message:string = RpcError`
        RpcError = ids::RPC_ERROR, "rpc_error" {
            error_code: i32,
            error_message: Bytes,
        }
    }

    tl_constructor! {
        /// Plaintext proof that a temporary key was issued under a persistent one.
        BindAuthKeyInner = ids::BIND_AUTH_KEY_INNER, "bind_auth_key_inner" {
            nonce: u64,
            temp_auth_key_id: u64,
            perm_auth_key_id: u64,
            temp_session_id: u64,
            expires_at: i32,
        }
    }

    tl_constructor! {
        MsgsAck = ids::MSGS_ACK, "msgs_ack" {
            msg_ids: Boxed<Vector<u64>>,
        }
    }

    tl_constructor! {
        MsgsStateReq = ids::MSGS_STATE_REQ, "msgs_state_req" {
            msg_ids: Boxed<Vector<u64>>,
        }
    }

    tl_constructor! {
        Pong = ids::PONG, "pong" {
            msg_id: u64,
            ping_id: u64,
        }
    }
}

/// RPC functions.
pub mod functions {
    use crate::{RemoteCall, ids};

    tl_constructor! {
        Ping = ids::PING, "ping" {
            ping_id: u64,
        }
    }

    impl RemoteCall for Ping {
        type Return = super::types::Pong;
    }

    pub mod auth {
        use crate::{Bytes, RemoteCall, ids};

        tl_constructor! {
            /// `auth.bindTempAuthKey perm_auth_key_id:long nonce:long
            /// expires_at:int encrypted_message:bytes = Bool`
            BindTempAuthKey = ids::AUTH_BIND_TEMP_AUTH_KEY, "auth.bindTempAuthKey" {
                perm_auth_key_id: u64,
                nonce: u64,
                expires_at: i32,
                encrypted_message: Bytes,
            }
        }

        impl RemoteCall for BindTempAuthKey {
            type Return = bool;
        }
    }
}
