use std::error::Error;
use std::fmt;
use std::fmt::Debug;

#[derive(Debug)]

pub struct DuplicateUsernameError;
#[derive(Debug)]

pub struct DuplicateRollNumberError;
#[derive(Debug)]

pub struct NoSuchStudentError;
impl fmt::Display for DuplicateUsernameError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "该用户名已被注册") // user-facing output
    }
}
impl fmt::Display for DuplicateRollNumberError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "该学籍号已存在") // user-facing output
    }
}
impl fmt::Display for NoSuchStudentError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "学籍号没有对应的学生记录") // user-facing output
    }
}

impl Error for DuplicateUsernameError {}
impl Error for DuplicateRollNumberError {}
impl Error for NoSuchStudentError {}
