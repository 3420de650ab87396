mod helpers;
mod inspector;
