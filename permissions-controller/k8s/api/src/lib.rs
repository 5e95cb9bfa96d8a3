#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod management;

pub use self::management::{Cluster, ClusterRoleTemplateBinding, User};
pub use kube::{
    api::{
        Api, DeleteParams, ListParams, ObjectMeta, Patch, PatchParams, PostParams, ResourceExt,
    },
    core::ErrorResponse,
    Client, Error, Resource,
};
