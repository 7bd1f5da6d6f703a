pub mod backup;
pub mod city;
pub mod media;
