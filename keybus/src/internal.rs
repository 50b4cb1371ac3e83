mod dispatch_loop;
mod subscription_table;

pub(crate) use dispatch_loop::DispatchLoop;
pub(crate) use subscription_table::SubscriptionTable;
